use crate::{animation::ease::Ease, foundation::core::Millis};

/// Interpolates one scalar from `from` to `to` over `duration`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub duration: Millis,
    #[serde(default)]
    pub ease: Ease,
}

impl Tween {
    pub fn linear(from: f64, to: f64, duration: Millis) -> Self {
        Self {
            from,
            to,
            duration,
            ease: Ease::Linear,
        }
    }

    pub fn eased(self, ease: Ease) -> Self {
        Self { ease, ..self }
    }

    /// Normalized progress after `elapsed`; a zero-length tween is already done.
    pub fn progress(&self, elapsed: Millis) -> f64 {
        if self.duration == Millis::ZERO {
            return 1.0;
        }
        (elapsed.0 as f64 / self.duration.0 as f64).min(1.0)
    }

    pub fn sample(&self, elapsed: Millis) -> f64 {
        let t = self.ease.apply(self.progress(elapsed));
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, elapsed: Millis) -> bool {
        elapsed >= self.duration
    }
}
