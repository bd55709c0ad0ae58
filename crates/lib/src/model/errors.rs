//! Error types for the entity model
use thiserror::Error;

/// Errors raised by entity-level invariant checks.
///
/// These are detected before any write is attempted, so a violating call
/// never produces a partial write.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// A login with the same (provider, key) pair already exists on the user.
    #[error("Login with provider '{provider}' and key '{key}' already exists")]
    DuplicateLogin { provider: String, key: String },

    /// A token with the same (provider, name) pair already exists on the user.
    #[error("Token with provider '{provider}' and name '{name}' already exists")]
    DuplicateToken { provider: String, name: String },

    /// The role is already assigned to the user.
    #[error("Role '{role}' is already assigned")]
    DuplicateRole { role: String },

    /// A required value was missing or empty on a mutating call.
    #[error("Required value missing: {field}")]
    MissingValue { field: &'static str },
}

impl ModelError {
    /// Check if this error is a within-user uniqueness violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            ModelError::DuplicateLogin { .. }
                | ModelError::DuplicateToken { .. }
                | ModelError::DuplicateRole { .. }
        )
    }

    /// Check if this error is a validation failure.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ModelError::MissingValue { .. })
    }
}

// Conversion from ModelError to the main Error type
impl From<ModelError> for crate::Error {
    fn from(err: ModelError) -> Self {
        crate::Error::Model(err)
    }
}
