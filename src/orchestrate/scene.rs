use std::{
    collections::BTreeSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    animation::ease::Ease,
    foundation::{
        core::{Millis, Rect},
        error::{EdgeFxError, EdgeFxResult},
    },
    geometry::{contour::AlphaMask, dash::DashPattern, outline::CornerRadii},
    orchestrate::options::{
        AnimationOptions, Feature, FilterOptions, Interval, Opacity, Options, StrokeOptions,
        check_color, check_opacity, check_width,
    },
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Outlined along its (possibly rounded) border box.
    #[default]
    Box,
    /// Outlined along the contour of its alpha channel.
    Image,
}

/// Per-element settings that win over the run-wide options.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ElementOverrides {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub opacity: Option<Opacity>,
    pub pattern: Option<DashPattern>,
    pub delay: Option<Millis>,
    pub duration: Option<Millis>,
    pub interval: Option<Interval>,
    pub parallel: Option<bool>,
    pub ease: Option<Ease>,
}

/// Stroke and animation settings of one element after overrides are applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSettings {
    pub stroke: StrokeOptions,
    pub animation: AnimationOptions,
}

impl ElementOverrides {
    /// Applies the run-wide stroke rules to whatever is overridden.
    pub fn validate(&self) -> EdgeFxResult<()> {
        if let Some(color) = &self.color {
            check_color(color, "overrides.color")?;
        }
        if let Some(width) = self.width {
            check_width(width, "overrides.width")?;
        }
        if let Some(opacity) = self.opacity {
            check_opacity(opacity, "overrides.opacity")?;
        }
        Ok(())
    }

    pub fn apply(&self, options: &Options) -> ElementSettings {
        let mut stroke = options.stroke.clone();
        let mut animation = options.animation;
        if let Some(color) = &self.color {
            stroke.color.clone_from(color);
        }
        if let Some(width) = self.width.filter(|w| w.is_finite() && *w >= 0.0) {
            stroke.width = width;
        }
        if let Some(opacity) = self.opacity {
            stroke.opacity = opacity;
        }
        if let Some(pattern) = self.pattern {
            stroke.pattern = pattern;
        }
        animation.delay = self.delay.unwrap_or(animation.delay);
        animation.duration = self.duration.unwrap_or(animation.duration);
        animation.interval = self.interval.unwrap_or(animation.interval);
        animation.parallel = self.parallel.unwrap_or(animation.parallel);
        animation.ease = self.ease.unwrap_or(animation.ease);
        ElementSettings { stroke, animation }
    }
}

/// A page element an effect can be drawn around.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub kind: ElementKind,
    /// Border box in page coordinates.
    pub rect: Rect,
    #[serde(default)]
    pub radii: CornerRadii,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub border_width: f64,
    /// PNG whose alpha channel outlines an image element; relative to the scene file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_path: Option<PathBuf>,
    #[serde(skip)]
    pub mask: Option<AlphaMask>,
    #[serde(default)]
    pub overrides: ElementOverrides,
}

impl Element {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            kind: ElementKind::Box,
            rect,
            radii: CornerRadii::default(),
            background: false,
            border_width: 0.0,
            mask_path: None,
            mask: None,
            overrides: ElementOverrides::default(),
        }
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Background => self.background,
            Feature::Border => self.border_width > 0.0,
            Feature::Image => self.kind == ElementKind::Image,
        }
    }
}

/// The elements of one page, in document order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub elements: Vec<Element>,
}

impl Scene {
    pub fn new(elements: Vec<Element>) -> EdgeFxResult<Self> {
        let scene = Self { elements };
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> EdgeFxResult<Self> {
        let scene: Self = serde_json::from_reader(r)
            .map_err(|e| EdgeFxError::validation(format!("parse scene JSON: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Reads a scene file and decodes every referenced mask image next to it.
    pub fn from_path(path: impl AsRef<Path>) -> EdgeFxResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            EdgeFxError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        let mut scene = Self::from_reader(BufReader::new(f))?;
        scene.load_masks(path.parent().unwrap_or(Path::new(".")))?;
        Ok(scene)
    }

    pub fn load_masks(&mut self, base: &Path) -> EdgeFxResult<()> {
        for el in &mut self.elements {
            let Some(rel) = &el.mask_path else {
                continue;
            };
            let file = base.join(rel);
            let img = image::open(&file).map_err(|e| {
                EdgeFxError::validation(format!(
                    "decode mask '{}' of element '{}': {e}",
                    file.display(),
                    el.id
                ))
            })?;
            el.mask = Some(AlphaMask::from_image(&img)?);
            tracing::debug!(element = %el.id, file = %file.display(), "loaded alpha mask");
        }
        Ok(())
    }

    pub fn validate(&self) -> EdgeFxResult<()> {
        let mut seen = BTreeSet::new();
        for el in &self.elements {
            if el.id.is_empty() {
                return Err(EdgeFxError::validation("element id must not be empty"));
            }
            if !seen.insert(el.id.as_str()) {
                return Err(EdgeFxError::validation(format!(
                    "duplicate element id '{}'",
                    el.id
                )));
            }
            let r = el.rect;
            if ![r.x0, r.y0, r.x1, r.y1].iter().all(|v| v.is_finite()) {
                return Err(EdgeFxError::validation(format!(
                    "element '{}' has a non-finite rect",
                    el.id
                )));
            }
            el.overrides.validate().map_err(|e| match e {
                EdgeFxError::Validation(msg) => {
                    EdgeFxError::validation(format!("element '{}': {msg}", el.id))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Indices of the elements `filter` keeps, in document order.
    pub fn select(&self, filter: &FilterOptions) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| filter.ids.is_empty() || filter.ids.iter().any(|id| *id == el.id))
            .filter(|(_, el)| {
                filter.features.is_empty() || filter.features.iter().any(|f| el.has_feature(*f))
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/scene.rs"]
mod tests;
