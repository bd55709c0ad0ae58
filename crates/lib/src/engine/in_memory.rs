//! In-memory engine implementation.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{EngineError, RowEngine};
use crate::Result;

type Table = HashMap<String, Vec<u8>>;
type Index = HashMap<String, BTreeSet<String>>;

/// A simple in-memory engine backed by `HashMap`s behind read-write locks.
///
/// Suitable for testing and development, or as the reference for what a
/// real cluster-backed engine must guarantee: per-row atomic writes, and a
/// conditional insert whose outcome is decided under exclusive access.
#[derive(Debug, Default)]
pub struct InMemory {
    /// Row tables with read-write lock for concurrent access
    tables: RwLock<HashMap<String, Table>>,
    /// Secondary index structures, maintained by the calling stores
    indexes: RwLock<HashMap<String, Index>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` engine.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A poisoned lock means another thread panicked mid-write; surface it as
/// engine unavailability rather than propagating the panic.
fn poisoned() -> crate::Error {
    EngineError::Unavailable {
        reason: "in-memory engine lock poisoned".to_string(),
    }
    .into()
}

#[async_trait]
impl RowEngine for InMemory {
    async fn get_row(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.get(table).and_then(|t| t.get(key)).cloned())
    }

    async fn put_row(&self, table: &str, key: &str, row: Vec<u8>) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), row);
        Ok(())
    }

    async fn insert_if_absent(&self, table: &str, key: &str, row: Vec<u8>) -> Result<bool> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables.entry(table.to_string()).or_default();
        if table.contains_key(key) {
            return Ok(false);
        }
        table.insert(key.to_string(), row);
        Ok(true)
    }

    async fn delete_row(&self, table: &str, key: &str) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        if let Some(table) = tables.get_mut(table) {
            table.remove(key);
        }
        Ok(())
    }

    async fn index_read(&self, index: &str, value: &str) -> Result<Vec<String>> {
        let indexes = self.indexes.read().map_err(|_| poisoned())?;
        Ok(indexes
            .get(index)
            .and_then(|i| i.get(value))
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn index_insert(&self, index: &str, value: &str, key: &str) -> Result<()> {
        let mut indexes = self.indexes.write().map_err(|_| poisoned())?;
        indexes
            .entry(index.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default()
            .insert(key.to_string());
        Ok(())
    }

    async fn index_remove(&self, index: &str, value: &str, key: &str) -> Result<()> {
        let mut indexes = self.indexes.write().map_err(|_| poisoned())?;
        if let Some(index) = indexes.get_mut(index)
            && let Some(keys) = index.get_mut(value)
        {
            keys.remove(key);
            if keys.is_empty() {
                index.remove(value);
            }
        }
        Ok(())
    }
}
