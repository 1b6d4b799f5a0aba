//! ChangeEvent: represents a mutation to a collection.
//!
//! Emitted by `ReactiveAdapter` after each successful write so that
//! subscribers know which collection and record changed, and what the record
//! looks like now (or looked like before a delete).

use serde_json::Value;

/// Kind of mutation, independent of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// A change event emitted by the reactive adapter after any mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A new record was inserted.
    Insert {
        collection: String,
        id: String,
        document: Value,
    },
    /// An existing record was replaced.
    Update {
        collection: String,
        id: String,
        document: Value,
    },
    /// A record was removed. `document` is the last stored version.
    Delete {
        collection: String,
        id: String,
        document: Value,
    },
}

impl ChangeEvent {
    /// The collection that was affected.
    pub fn collection(&self) -> &str {
        match self {
            Self::Insert { collection, .. } => collection,
            Self::Update { collection, .. } => collection,
            Self::Delete { collection, .. } => collection,
        }
    }

    /// Primary key of the record that was affected.
    pub fn id(&self) -> &str {
        match self {
            Self::Insert { id, .. } => id,
            Self::Update { id, .. } => id,
            Self::Delete { id, .. } => id,
        }
    }

    pub fn document(&self) -> &Value {
        match self {
            Self::Insert { document, .. } => document,
            Self::Update { document, .. } => document,
            Self::Delete { document, .. } => document,
        }
    }

    pub fn operation(&self) -> ChangeOperation {
        match self {
            Self::Insert { .. } => ChangeOperation::Insert,
            Self::Update { .. } => ChangeOperation::Update,
            Self::Delete { .. } => ChangeOperation::Delete,
        }
    }
}
