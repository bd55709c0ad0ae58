//! Error types for store operations
use thiserror::Error;

use crate::model::{RoleId, UserId};

/// Errors raised by the store operations layer.
///
/// Uniqueness conflicts here are the cross-row kind: the engine's
/// conditional insert lost the race for a marker row. Within-user conflicts
/// surface as [`ModelError`](crate::model::ModelError) instead.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another user already holds this normalized user name or email.
    #[error("A user with {field} '{value}' already exists")]
    DuplicateUser {
        /// Which unique field collided ("user name" or "email")
        field: &'static str,
        /// The normalized value that collided
        value: String,
    },

    /// Another role already holds this normalized name.
    #[error("A role with normalized name '{value}' already exists")]
    DuplicateRoleName { value: String },

    /// A mutating operation targeted a user that does not exist.
    ///
    /// Finders report absence as `Ok(None)`; this is only for operations
    /// that need an existing row to work on.
    #[error("User not found: {id}")]
    UserNotFound { id: UserId },

    /// A mutating operation targeted a role that does not exist.
    #[error("Role not found: {id}")]
    RoleNotFound { id: RoleId },
}

impl StoreError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UserNotFound { .. } | StoreError::RoleNotFound { .. }
        )
    }

    /// Check if this error is a cross-row uniqueness conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateUser { .. } | StoreError::DuplicateRoleName { .. }
        )
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
