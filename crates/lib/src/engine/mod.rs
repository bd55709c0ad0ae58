//! Storage engine abstraction for wide-row persistence.
//!
//! The `RowEngine` trait is the seam between the identity stores and the
//! actual column-family database. Implementations handle the specifics of
//! how rows are placed and fetched (in memory, over a cluster driver, ...);
//! the stores only rely on the contract spelled out here.
//!
//! The trait deliberately offers no multi-row transaction: the only
//! atomicity primitive is `insert_if_absent`, and everything the stores
//! build on top of it (uniqueness markers, index maintenance) is designed
//! around that limitation.

use async_trait::async_trait;

use crate::Result;

mod errors;
pub use errors::EngineError;

mod in_memory;
pub use in_memory::InMemory;

/// Storage engine trait abstracting the underlying wide-row database.
///
/// Tables are flat namespaces of `key -> row` pairs; a row is an opaque byte
/// blob written and read as one unit, which is what makes nested
/// sub-structures inside it atomic. Indexes are separate `value -> set of
/// keys` structures maintained explicitly by the caller.
///
/// All engine implementations must be `Send` and `Sync` to allow sharing
/// across threads. Timeouts and driver-level retries are the engine's
/// responsibility; the calling stores never retry.
#[async_trait]
pub trait RowEngine: Send + Sync {
    /// Retrieves a row by key.
    ///
    /// # Returns
    /// `Ok(None)` when no row exists at the key — absence is not an error.
    async fn get_row(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a row, replacing any previous value atomically.
    async fn put_row(&self, table: &str, key: &str, row: Vec<u8>) -> Result<()>;

    /// Writes a row only if no row currently exists at the key.
    ///
    /// This is the sole atomicity primitive the stores use to emulate
    /// uniqueness constraints: when two writers race, the engine's answer
    /// here is the authoritative decision on who won.
    ///
    /// # Returns
    /// `Ok(true)` when the row was written, `Ok(false)` when a row already
    /// existed (the value at the key is left untouched).
    async fn insert_if_absent(&self, table: &str, key: &str, row: Vec<u8>) -> Result<bool>;

    /// Deletes a row. Deleting an absent key succeeds silently.
    async fn delete_row(&self, table: &str, key: &str) -> Result<()>;

    /// Reads the keys associated with a value in a secondary index.
    ///
    /// # Returns
    /// The matching keys in unspecified order; empty when the value is
    /// unknown to the index.
    async fn index_read(&self, index: &str, value: &str) -> Result<Vec<String>>;

    /// Associates a key with a value in a secondary index.
    ///
    /// Inserting an association that already exists succeeds silently.
    async fn index_insert(&self, index: &str, value: &str, key: &str) -> Result<()>;

    /// Removes a key's association with a value from a secondary index.
    ///
    /// Removing an absent association succeeds silently.
    async fn index_remove(&self, index: &str, value: &str, key: &str) -> Result<()>;
}
