//! Shared fixtures for the integration suite.

use std::sync::Arc;

use async_trait::async_trait;
use tessera::engine::{EngineError, InMemory, RowEngine};
use tessera::model::User;
use tessera::{Result, RoleStore, UserStore};

/// Builds a user store over a fresh in-memory engine.
pub fn user_store() -> UserStore {
    UserStore::new(Arc::new(InMemory::new()))
}

/// Builds a user store and a role store sharing one engine.
pub fn stores() -> (UserStore, RoleStore) {
    let engine = Arc::new(InMemory::new());
    (UserStore::new(engine.clone()), RoleStore::new(engine))
}

/// Builds a user store sharing the given engine.
pub fn user_store_on(engine: Arc<InMemory>) -> UserStore {
    UserStore::new(engine)
}

/// A user with name and email set the way an identity subsystem would
/// hand them over: display values plus case-folded normalized copies.
pub fn sample_user(name: &str) -> User {
    let mut user = User::new();
    user.set_user_name(name.to_string());
    user.set_normalized_user_name(name.to_uppercase());
    let email = format!("{}@example.com", name.to_lowercase());
    user.set_normalized_email(email.to_uppercase());
    user.set_email(email);
    user
}

/// An engine double that fails every call, for testing that storage
/// failures propagate verbatim and untouched.
pub struct UnavailableEngine;

fn unavailable() -> tessera::Error {
    EngineError::Unavailable {
        reason: "cluster unreachable".to_string(),
    }
    .into()
}

#[async_trait]
impl RowEngine for UnavailableEngine {
    async fn get_row(&self, _table: &str, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(unavailable())
    }

    async fn put_row(&self, _table: &str, _key: &str, _row: Vec<u8>) -> Result<()> {
        Err(unavailable())
    }

    async fn insert_if_absent(&self, _table: &str, _key: &str, _row: Vec<u8>) -> Result<bool> {
        Err(unavailable())
    }

    async fn delete_row(&self, _table: &str, _key: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn index_read(&self, _index: &str, _value: &str) -> Result<Vec<String>> {
        Err(unavailable())
    }

    async fn index_insert(&self, _index: &str, _value: &str, _key: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn index_remove(&self, _index: &str, _value: &str, _key: &str) -> Result<()> {
        Err(unavailable())
    }
}
