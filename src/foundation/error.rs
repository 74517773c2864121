/// Result alias used across the crate.
pub type KineResult<T> = Result<T, KineError>;

/// Error taxonomy for sessions and their building blocks.
///
/// Only `Input`, `Capture` and `Finalize` ever reach an export observer; `Asset` failures are
/// absorbed with a fallback at the point where they happen.
#[derive(thiserror::Error, Debug)]
pub enum KineError {
    #[error("input error: {0}")]
    Input(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("finalization error: {0}")]
    Finalize(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KineError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn finalize(msg: impl Into<String>) -> Self {
        Self::Finalize(msg.into())
    }

    /// Short human-readable message suitable for `on_error`.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(m)
            | Self::Validation(m)
            | Self::Asset(m)
            | Self::Capture(m)
            | Self::Finalize(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }
}
