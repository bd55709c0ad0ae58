//!
//! Tessera: identity storage on wide-row databases.
//! This library stores the records an identity subsystem needs — users with
//! credentials, external logins, tokens, and role memberships — in a
//! column-family storage engine, while upholding the relational-style
//! guarantees such a subsystem expects (unique usernames and emails, atomic
//! credential updates, set semantics for multi-valued attributes).
//!
//! ## Core Concepts
//!
//! Tessera is built around several key concepts:
//!
//! * **Entities (`model::User`, `model::Role`)**: The in-memory aggregates. Collections of
//!   logins, tokens, and roles are owned exclusively by the entity and mutated only through
//!   named operations that enforce uniqueness before anything reaches storage.
//! * **Rows (`row::UserRow`, `row::RoleRow`)**: The denormalized wide-row representation.
//!   The mapping layer decides which field is the partition key, which nested structures are
//!   written as one frozen blob, and which fields feed secondary lookup structures.
//! * **Engines (`engine::RowEngine`)**: A pluggable storage layer offering row reads/writes,
//!   a conditional insert-if-absent primitive, and secondary-index maintenance. An in-memory
//!   engine is provided for tests and development.
//! * **Stores (`store::UserStore`, `store::RoleStore`)**: The operations an identity
//!   subsystem calls. Global uniqueness of normalized usernames and emails is emulated with
//!   conditional marker rows, since the underlying engine has no cross-partition constraints.
//! * **Collaborators (`crypto`)**: Credential hashing and opaque token generation, consumed
//!   behind traits so the algorithms stay swappable.

pub mod crypto;
pub mod engine;
pub mod model;
pub mod row;
pub mod store;

/// Re-export the aggregate roots for easier access.
pub use model::{Role, User};
/// Re-export the store types, the main entry points of the library.
pub use store::{RoleStore, UserStore};

/// Result type used throughout the Tessera library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Tessera library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured entity-invariant errors from the model module
    #[error(transparent)]
    Model(model::ModelError),

    /// Structured mapping errors from the row module
    #[error(transparent)]
    Row(row::RowError),

    /// Structured storage errors from the engine module
    #[error(transparent)]
    Engine(engine::EngineError),

    /// Structured store-operation errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured collaborator errors from the crypto module
    #[error(transparent)]
    Crypto(crypto::CryptoError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Model(_) => "model",
            Error::Row(_) => "row",
            Error::Engine(_) => "engine",
            Error::Store(_) => "store",
            Error::Crypto(_) => "crypto",
        }
    }

    /// Check if this error indicates a resource was not found.
    ///
    /// Finders represent absence as `Ok(None)`; this classifies the
    /// exceptional case of mutating a user or role that does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a uniqueness conflict, either within a
    /// single user's collections or across all users.
    pub fn is_duplicate(&self) -> bool {
        match self {
            Error::Model(model_err) => model_err.is_duplicate(),
            Error::Store(store_err) => store_err.is_duplicate(),
            _ => false,
        }
    }

    /// Check if this error is a validation failure on a mutating call.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Model(model_err) => model_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is a storage failure propagated from the engine.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Engine(engine_err) if engine_err.is_unavailable())
    }

    /// Check if this error is a row serialization or deserialization failure.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::Row(_))
    }
}
