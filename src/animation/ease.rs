use std::f64::consts::PI;

/// Timing curve of a tween, named after the d3 easing family.
///
/// Curves map progress in `[0, 1]` onto `[0, 1]` and pin both endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicInOut,
    SinInOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        // NaN progress counts as not started.
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => t * (2.0 - t),
            Self::QuadInOut => {
                let u = t * 2.0;
                if u <= 1.0 {
                    u * u / 2.0
                } else {
                    let u = u - 1.0;
                    (u * (2.0 - u) + 1.0) / 2.0
                }
            }
            Self::CubicInOut => {
                let u = t * 2.0;
                if u <= 1.0 {
                    u * u * u / 2.0
                } else {
                    let u = u - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
            Self::SinInOut => (1.0 - (PI * t).cos()) / 2.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
