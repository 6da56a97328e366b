use crate::{
    animation::ease::Ease,
    foundation::{
        core::{DraftId, Millis, Rect},
        error::EdgeFxResult,
        rng::Rng64,
    },
    geometry::outline::{Outline, surface_frame},
    orchestrate::scene::{Element, ElementKind, ElementSettings},
    render::surface::{RenderCommand, StrokeStyle, Target},
};

/// Timing of a draft's job, with random choices already made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DraftTiming {
    pub delay: Millis,
    pub duration: Millis,
    pub interval: Millis,
    pub parallel: bool,
    /// Curve of the drawing tween.
    pub ease: Ease,
}

/// Everything needed to draw an effect around one element.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    pub id: DraftId,
    pub element: String,
    /// Surface rectangle in page coordinates.
    pub frame: Rect,
    /// Outline in surface-local coordinates.
    pub outline: Outline,
    pub style: StrokeStyle,
    pub timing: DraftTiming,
}

impl Draft {
    pub fn build(
        id: DraftId,
        element: &Element,
        settings: &ElementSettings,
        rng: &mut Rng64,
    ) -> EdgeFxResult<Self> {
        let stroke = &settings.stroke;
        let offset = stroke.width;
        let (w, h) = (element.rect.width().abs(), element.rect.height().abs());
        let outline = match (&element.kind, &element.mask) {
            (ElementKind::Image, Some(mask)) => Outline::from_mask(mask, w, h, offset)?,
            (ElementKind::Image, None) => {
                tracing::warn!(element = %element.id, "image element has no mask; outlining its box");
                Outline::rounded(w, h, element.radii, offset)?
            }
            (ElementKind::Box, _) => Outline::rounded(w, h, element.radii, offset)?,
        };
        let length = outline.length();
        let style = StrokeStyle {
            color: stroke.color.clone(),
            width: stroke.width,
            opacity: stroke.opacity.resolve(rng),
            dash_array: stroke.pattern.dash_array(length),
            dash_offset: length,
        };
        let timing = DraftTiming {
            delay: settings.animation.delay,
            duration: settings.animation.duration,
            interval: settings.animation.interval.resolve(rng),
            parallel: settings.animation.parallel,
            ease: settings.animation.ease,
        };
        Ok(Self {
            id,
            element: element.id.clone(),
            frame: surface_frame(element.rect.abs(), stroke.width),
            outline,
            style,
            timing,
        })
    }

    pub fn element_target(&self) -> Target {
        Target::element(self.element.clone())
    }

    pub fn surface_target(&self) -> Target {
        Target::Surface { draft: self.id }
    }

    pub fn path_target(&self) -> Target {
        Target::Path { draft: self.id }
    }

    pub fn clone_target(&self, index: usize) -> Target {
        Target::Clone {
            draft: self.id,
            index,
        }
    }

    /// Commands that materialise the surface and its (not yet drawn) path.
    pub fn create_commands(&self) -> [RenderCommand; 2] {
        [
            RenderCommand::CreateSurface {
                draft: self.id,
                element: self.element.clone(),
                frame: self.frame,
            },
            RenderCommand::CreatePath {
                draft: self.id,
                svg: self.outline.to_svg(),
                length: self.outline.length(),
                style: self.style.clone(),
            },
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/draft.rs"]
mod tests;
