//! Error types for the storage engine boundary
use thiserror::Error;

/// Errors that can occur at the storage engine boundary.
///
/// The core treats any engine failure as propagate-upward: no operation is
/// retried here, since retrying a non-idempotent add could double-fire or
/// report a false duplicate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The storage engine could not serve the request.
    #[error("Storage engine unavailable: {reason}")]
    Unavailable {
        /// Description of the failure, passed through verbatim
        reason: String,
    },
}

impl EngineError {
    /// Check if this error indicates the engine was unavailable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable { .. })
    }
}

// Conversion from EngineError to the main Error type
impl From<EngineError> for crate::Error {
    fn from(err: EngineError) -> Self {
        crate::Error::Engine(err)
    }
}
