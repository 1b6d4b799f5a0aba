/// Storage backend trait for wallet-db.
///
/// `StorageBackend` is the narrow raw I/O trait implemented by concrete
/// backends. Collection semantics (schema validation, change events) live in
/// the adapter layer above it.
use serde_json::Value;

use crate::collection::builder::CollectionDef;
use crate::error::Result;
use crate::index::types::FieldIndex;
use crate::types::{RawBatchResult, SerializedRecord};

/// Low-level storage backend: raw record I/O with no collection semantics.
///
/// Implementors must be `Send + Sync` so they can be shared across threads.
pub trait StorageBackend: Send + Sync {
    /// Create whatever per-collection structures (SQL indexes) the backend
    /// needs. Must be idempotent.
    fn register_collection(&self, def: &CollectionDef) -> Result<()>;

    /// Fetch a single raw record by collection and id.
    fn get_raw(&self, collection: &str, id: &str) -> Result<Option<SerializedRecord>>;

    /// Insert a new record. Fails with `StorageError::UniqueConstraint` if a
    /// record with the same id already exists in the collection.
    fn insert_raw(&self, collection: &str, id: &str, data: &Value) -> Result<SerializedRecord>;

    /// Replace the data of an existing record, keeping its sequence number.
    /// Returns `None` if there is no such record.
    fn replace_raw(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<Option<SerializedRecord>>;

    /// Remove a record, returning what was stored.
    fn delete_raw(&self, collection: &str, id: &str) -> Result<Option<SerializedRecord>>;

    /// Scan all records in a collection in insertion order.
    fn scan_raw(&self, collection: &str) -> Result<RawBatchResult>;

    /// Count records in a collection.
    fn count_raw(&self, collection: &str) -> Result<usize>;

    /// Read a metadata key-value pair (schema fingerprints, etc.).
    fn get_meta(&self, key: &str) -> Result<Option<String>>;

    /// Write a metadata key-value pair.
    fn set_meta(&self, key: &str, value: &str) -> Result<()>;

    /// Execute a closure inside a backend transaction.
    ///
    /// Implementations begin a transaction before calling `f` and commit (or
    /// roll back on error) after it returns.
    fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;

    /// Check that a unique index is not violated.
    ///
    /// Returns `Err(StorageError::UniqueConstraint { .. })` if another record
    /// already holds the same value. `exclude_id` is the record being written.
    fn check_unique(
        &self,
        collection: &str,
        index: &FieldIndex,
        data: &Value,
        exclude_id: Option<&str>,
    ) -> Result<()>;
}
