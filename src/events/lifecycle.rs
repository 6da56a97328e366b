use std::{fmt, str::FromStr};

use crate::foundation::error::EdgeFxError;

/// Named points of an orchestration run, in firing order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Ready,
    Init,
    Onload,
    Create,
    Queue,
    Animate,
    Complete,
}

impl Lifecycle {
    pub const ORDER: [Lifecycle; 7] = [
        Self::Ready,
        Self::Init,
        Self::Onload,
        Self::Create,
        Self::Queue,
        Self::Animate,
        Self::Complete,
    ];

    /// Event name as registered on the bus.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Init => "init",
            Self::Onload => "onload",
            Self::Create => "create",
            Self::Queue => "queue",
            Self::Animate => "animate",
            Self::Complete => "complete",
        }
    }

    pub fn next(self) -> Option<Self> {
        let idx = Self::ORDER.iter().position(|e| *e == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Lifecycle {
    type Err = EdgeFxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| EdgeFxError::event(format!("unknown lifecycle event '{s}'")))
    }
}
