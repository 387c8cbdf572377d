//! Error types for dynamics processing

use thiserror::Error;

/// Result type for dynamics operations
pub type Result<T> = std::result::Result<T, DynamicsError>;

/// Errors that can occur while configuring a dynamics processor
///
/// These are only produced at construction or parameter-update time.
/// The per-sample processing path has no failure modes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    /// Zero sample rate, or a parameter value that cannot be clamped into
    /// a usable range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DynamicsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}
