use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record as stored in the backend.
///
/// `data` is the full JSON document, including the primary key field.
/// `sequence` is assigned by the backend on first write and never reused; it
/// orders records that compare equal on every sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRecord {
    pub id: String,
    pub collection: String,
    pub data: Value,
    pub sequence: i64,
}

/// Batch result from a raw scan.
#[derive(Debug, Clone, Default)]
pub struct RawBatchResult {
    pub records: Vec<SerializedRecord>,
}

/// Result of a query operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matching documents after filter, sort, and pagination.
    pub records: Vec<Value>,
    /// Number of matches before pagination.
    pub total: usize,
}

/// How a write should treat an existing record with the same primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with a unique-constraint error if the key exists.
    Insert,
    /// Replace the existing record, or insert if absent.
    Upsert,
}

/// Outcome of a successful write, used to pick the change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Replaced,
}
