//! Query type definitions: selector, sort, pagination.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Sort Types
// ============================================================================

/// Sort direction for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort order for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    pub field: String,
    pub direction: SortDirection,
}

/// Sort input: either a shorthand field name (ascending) or explicit entries.
#[derive(Debug, Clone)]
pub enum SortInput {
    /// Single field name, sorts ascending.
    Field(String),
    /// Explicit ordered sort entries.
    Entries(Vec<SortEntry>),
}

/// Normalize sort input to a vec of SortEntry.
pub fn normalize_sort(sort: Option<SortInput>) -> Option<Vec<SortEntry>> {
    match sort {
        None => None,
        Some(SortInput::Field(f)) => Some(vec![SortEntry {
            field: f,
            direction: SortDirection::Asc,
        }]),
        Some(SortInput::Entries(e)) => Some(e),
    }
}

// ============================================================================
// Query Type
// ============================================================================

/// Selector, sort, and pagination for one read.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// MongoDB-style selector object.
    pub filter: Option<Value>,
    /// Sort order; ties keep insertion order.
    pub sort: Option<SortInput>,
    /// Maximum number of results to return.
    pub limit: Option<usize>,
    /// Number of results to skip.
    pub offset: Option<usize>,
}

impl Query {
    /// Match every record, no sort.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records against a selector.
    pub fn selector(filter: Value) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Sort ascending by `field`.
    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(SortInput::Field(field.into()));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}
