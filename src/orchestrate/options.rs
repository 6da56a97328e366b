use std::{fs::File, io::BufReader, path::Path};

use crate::{
    animation::ease::Ease,
    foundation::{
        core::Millis,
        error::{EdgeFxError, EdgeFxResult},
        rng::Rng64,
    },
    geometry::dash::DashPattern,
    sequencer::SequencerConfig,
};

/// How elements and outlines are revealed around the animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    /// Hide everything, draw the outline, then reveal the element and fade the outline.
    #[default]
    Showcase,
    /// Draw the outline, then fade the element in.
    Fadein,
    /// Elements stay where they are; the outline draws over them.
    Inline,
    /// Only the outline is shown.
    Solo,
    /// Nothing is revealed.
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PresentationOptions {
    pub mode: PresentationMode,
    pub duration: Millis,
    /// Wait before the first job runs.
    pub delay: Millis,
    /// Curve of the reveal fades.
    pub ease: Ease,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            mode: PresentationMode::default(),
            duration: Millis(3000),
            delay: Millis(2000),
            ease: Ease::Linear,
        }
    }
}

/// Wire form shared by [`Opacity`] and [`Interval`]: a bare value, `{"fixed": value}`, or a
/// keyword (`"random"` or a numeric string).
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum ChoiceRepr<T> {
    Value(T),
    Tagged { fixed: T },
    Keyword(String),
}

/// `None` when the repr names `keyword` instead of a value.
fn parse_choice<T: std::str::FromStr>(
    repr: ChoiceRepr<T>,
    keyword: &str,
) -> Result<Option<T>, String> {
    match repr {
        ChoiceRepr::Value(v) | ChoiceRepr::Tagged { fixed: v } => Ok(Some(v)),
        ChoiceRepr::Keyword(word) => {
            let word = word.trim();
            if word.eq_ignore_ascii_case(keyword) {
                return Ok(None);
            }
            word.parse()
                .map(Some)
                .map_err(|_| format!("expected a number or {keyword:?}, got {word:?}"))
        }
    }
}

/// Stroke opacity: a fixed value or a fresh pick per outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ChoiceRepr<f64>", into = "ChoiceRepr<f64>")]
pub enum Opacity {
    #[default]
    Random,
    Fixed(f64),
}

impl TryFrom<ChoiceRepr<f64>> for Opacity {
    type Error = String;

    fn try_from(repr: ChoiceRepr<f64>) -> Result<Self, Self::Error> {
        Ok(parse_choice(repr, "random")?.map_or(Self::Random, Self::Fixed))
    }
}

impl From<Opacity> for ChoiceRepr<f64> {
    fn from(o: Opacity) -> Self {
        match o {
            Opacity::Random => Self::Keyword("random".to_string()),
            Opacity::Fixed(v) => Self::Value(v),
        }
    }
}

impl Opacity {
    /// Random picks land in `[0.10, 0.90]` on a 0.01 grid.
    pub fn resolve(self, rng: &mut Rng64) -> f64 {
        match self {
            Self::Fixed(v) => v,
            Self::Random => rng.range_inclusive(10, 90) as f64 / 100.0,
        }
    }
}

/// Pause between an outline finishing and its job completing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ChoiceRepr<u64>", into = "ChoiceRepr<u64>")]
pub enum Interval {
    #[default]
    Random,
    Fixed(Millis),
}

impl TryFrom<ChoiceRepr<u64>> for Interval {
    type Error = String;

    fn try_from(repr: ChoiceRepr<u64>) -> Result<Self, Self::Error> {
        Ok(parse_choice(repr, "random")?.map_or(Self::Random, |ms| Self::Fixed(Millis(ms))))
    }
}

impl From<Interval> for ChoiceRepr<u64> {
    fn from(i: Interval) -> Self {
        match i {
            Interval::Random => Self::Keyword("random".to_string()),
            Interval::Fixed(ms) => Self::Value(ms.0),
        }
    }
}

impl Interval {
    pub const RANDOM_MIN: Millis = Millis(100);
    pub const RANDOM_MAX: Millis = Millis(900);

    pub fn resolve(self, rng: &mut Rng64) -> Millis {
        match self {
            Self::Fixed(v) => v,
            Self::Random => Millis(rng.range_inclusive(Self::RANDOM_MIN.0, Self::RANDOM_MAX.0)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StrokeOptions {
    pub color: String,
    pub width: f64,
    pub opacity: Opacity,
    pub pattern: DashPattern,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            color: "#000".to_string(),
            width: 2.0,
            opacity: Opacity::Random,
            pattern: DashPattern::Solid,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    /// Per-job delay before the job body runs.
    pub delay: Millis,
    /// How long the outline takes to draw.
    pub duration: Millis,
    pub interval: Interval,
    /// Whether jobs join the previous slot (`true`) or open a new one.
    pub parallel: bool,
    /// Curve of the drawing tween.
    pub ease: Ease,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            delay: Millis::ZERO,
            duration: Millis(1000),
            interval: Interval::Random,
            parallel: true,
            ease: Ease::Linear,
        }
    }
}

/// Element traits a selection can be narrowed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Background,
    Border,
    Image,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Keep elements with at least one of these; empty keeps all.
    pub features: Vec<Feature>,
    /// When non-empty, only these element ids are considered.
    pub ids: Vec<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            features: vec![Feature::Background, Feature::Border, Feature::Image],
            ids: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RippleStroke {
    pub color: String,
    pub width: f64,
}

impl Default for RippleStroke {
    fn default() -> Self {
        Self {
            color: "#000".to_string(),
            width: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RippleOptions {
    pub waves: u32,
    /// Growth of the outermost wave on each side, in px.
    pub pixels: f64,
    pub duration: Millis,
    pub interval: Millis,
    pub stroke: RippleStroke,
}

impl Default for RippleOptions {
    fn default() -> Self {
        Self {
            waves: 5,
            pixels: 10.0,
            duration: Millis(1000),
            interval: Millis(500),
            stroke: RippleStroke::default(),
        }
    }
}

/// How fast bubbles rise: matched to the wave, or a fixed level from 1 to 10.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ChoiceRepr<f64>", into = "ChoiceRepr<f64>")]
pub enum BubbleSpeed {
    #[default]
    Auto,
    Fixed(f64),
}

impl TryFrom<ChoiceRepr<f64>> for BubbleSpeed {
    type Error = String;

    fn try_from(repr: ChoiceRepr<f64>) -> Result<Self, Self::Error> {
        Ok(parse_choice(repr, "auto")?.map_or(Self::Auto, Self::Fixed))
    }
}

impl From<BubbleSpeed> for ChoiceRepr<f64> {
    fn from(s: BubbleSpeed) -> Self {
        match s {
            BubbleSpeed::Auto => Self::Keyword("auto".to_string()),
            BubbleSpeed::Fixed(v) => Self::Value(v),
        }
    }
}

impl BubbleSpeed {
    /// Px per second of a fixed level: each step is 20 px/s, clamped to `[1, 10]`.
    pub fn fixed_px_per_sec(self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Fixed(level) => Some(level.clamp(1.0, 10.0) * 20.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BubbleOptions {
    /// Bubbles per element; zero disables them.
    pub amount: u32,
    pub speed: BubbleSpeed,
    /// Fill colour; `None` or `"auto"` uses a light grey.
    pub tint: Option<String>,
}

impl Default for BubbleOptions {
    fn default() -> Self {
        Self {
            amount: 5,
            speed: BubbleSpeed::Auto,
            tint: None,
        }
    }
}

impl BubbleOptions {
    pub const AUTO_TINT: &str = "#BBBBBB";

    pub fn tint(&self) -> &str {
        match self.tint.as_deref().map(str::trim) {
            None | Some("auto") => Self::AUTO_TINT,
            Some(tint) => tint,
        }
    }
}

/// What the rising wave clips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavesMode {
    /// The element itself fills up from below.
    #[default]
    Mask,
    /// A filled outline floods the element's surface.
    Overlay,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WavesOptions {
    /// Target running time of the rise; the frame count rounds it up.
    pub duration: Millis,
    /// Wave frames per second.
    pub fps: f64,
    /// Roughness of the wave; five samples per step, at least six in all.
    pub resolution: u32,
    pub amplitude: f64,
    pub bubbles: BubbleOptions,
    pub mode: WavesMode,
}

impl Default for WavesOptions {
    fn default() -> Self {
        Self {
            duration: Millis(10_000),
            fps: 2.0,
            resolution: 5,
            amplitude: 1.0,
            bubbles: BubbleOptions::default(),
            mode: WavesMode::Mask,
        }
    }
}

impl WavesOptions {
    fn validate(&self) -> EdgeFxResult<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(EdgeFxError::validation(format!(
                "waves.fps must be finite and > 0, got {}",
                self.fps
            )));
        }
        if !self.amplitude.is_finite() || self.amplitude <= 0.0 {
            return Err(EdgeFxError::validation(format!(
                "waves.amplitude must be finite and > 0, got {}",
                self.amplitude
            )));
        }
        if let BubbleSpeed::Fixed(v) = self.bubbles.speed
            && !v.is_finite()
        {
            return Err(EdgeFxError::validation("waves.bubbles.speed must be finite"));
        }
        if let Some(tint) = &self.bubbles.tint {
            check_color(tint, "waves.bubbles.tint")?;
        }
        Ok(())
    }
}

/// One effect to play on every draft.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum EffectConfig {
    Stroke,
    Ripple(RippleOptions),
    Waves(WavesOptions),
}

impl EffectConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stroke => "stroke",
            Self::Ripple(_) => "ripple",
            Self::Waves(_) => "waves",
        }
    }
}

/// Everything a run can be configured with. All fields have defaults, so `{}` is valid.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Options {
    pub presentation: PresentationOptions,
    pub stroke: StrokeOptions,
    pub animation: AnimationOptions,
    pub filter: FilterOptions,
    pub effects: Vec<EffectConfig>,
    pub sequencer: SequencerConfig,
    /// Seed for random opacity and interval picks.
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            presentation: PresentationOptions::default(),
            stroke: StrokeOptions::default(),
            animation: AnimationOptions::default(),
            filter: FilterOptions::default(),
            effects: vec![EffectConfig::Stroke],
            sequencer: SequencerConfig::default(),
            seed: 1,
        }
    }
}

impl Options {
    pub fn from_reader<R: std::io::Read>(r: R) -> EdgeFxResult<Self> {
        let options: Self = serde_json::from_reader(r)
            .map_err(|e| EdgeFxError::validation(format!("parse options JSON: {e}")))?;
        options.validated()
    }

    pub fn from_path(path: impl AsRef<Path>) -> EdgeFxResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            EdgeFxError::validation(format!("open options JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Checks value ranges and fills an empty effect list with the stroke effect.
    pub fn validated(mut self) -> EdgeFxResult<Self> {
        self.validate()?;
        if self.effects.is_empty() {
            self.effects.push(EffectConfig::Stroke);
        }
        Ok(self)
    }

    pub fn validate(&self) -> EdgeFxResult<()> {
        check_stroke(&self.stroke.color, self.stroke.width, "stroke")?;
        check_opacity(self.stroke.opacity, "stroke.opacity")?;
        if self.animation.duration == Millis::ZERO {
            tracing::debug!("animation.duration is zero; outlines appear instantly");
        }
        for effect in &self.effects {
            match effect {
                EffectConfig::Stroke => {}
                EffectConfig::Ripple(r) => {
                    if r.waves == 0 {
                        return Err(EdgeFxError::validation("ripple.waves must be at least 1"));
                    }
                    if !r.pixels.is_finite() || r.pixels < 0.0 {
                        return Err(EdgeFxError::validation(format!(
                            "ripple.pixels must be finite and >= 0, got {}",
                            r.pixels
                        )));
                    }
                    check_stroke(&r.stroke.color, r.stroke.width, "ripple.stroke")?;
                }
                EffectConfig::Waves(w) => w.validate()?,
            }
        }
        Ok(())
    }
}

fn check_stroke(color: &str, width: f64, what: &str) -> EdgeFxResult<()> {
    check_color(color, &format!("{what}.color"))?;
    check_width(width, &format!("{what}.width"))
}

pub(crate) fn check_color(color: &str, what: &str) -> EdgeFxResult<()> {
    if color.trim().is_empty() {
        return Err(EdgeFxError::validation(format!("{what} must not be empty")));
    }
    Ok(())
}

pub(crate) fn check_width(width: f64, what: &str) -> EdgeFxResult<()> {
    if !width.is_finite() || width < 0.0 {
        return Err(EdgeFxError::validation(format!(
            "{what} must be finite and >= 0, got {width}"
        )));
    }
    Ok(())
}

pub(crate) fn check_opacity(opacity: Opacity, what: &str) -> EdgeFxResult<()> {
    if let Opacity::Fixed(v) = opacity
        && !(0.0..=1.0).contains(&v)
    {
        return Err(EdgeFxError::validation(format!(
            "{what} must be within [0, 1], got {v}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/options.rs"]
mod tests;
