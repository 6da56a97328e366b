/// Convenience result type used across edgefx.
pub type EdgeFxResult<T> = Result<T, EdgeFxError>;

/// Top-level error taxonomy used by the bus, the sequencer and the orchestrator.
#[derive(thiserror::Error, Debug)]
pub enum EdgeFxError {
    /// Invalid user-provided options or scene data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Misuse of the lifecycle event bus.
    #[error("event error: {0}")]
    Event(String),

    /// Schedule state machine violations (adding after start, starting twice).
    #[error("sequencer error: {0}")]
    Sequencer(String),

    /// Outline tracing failures.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EdgeFxError {
    /// Build a [`EdgeFxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EdgeFxError::Event`] value.
    pub fn event(msg: impl Into<String>) -> Self {
        Self::Event(msg.into())
    }

    /// Build a [`EdgeFxError::Sequencer`] value.
    pub fn sequencer(msg: impl Into<String>) -> Self {
        Self::Sequencer(msg.into())
    }

    /// Build a [`EdgeFxError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`EdgeFxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for EdgeFxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
