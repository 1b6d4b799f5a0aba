//! Index type definitions for collection schemas.

use serde::{Deserialize, Serialize};

// ============================================================================
// Sort Order
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexSortOrder {
    Asc,
    Desc,
}

// ============================================================================
// Field Index Types
// ============================================================================

/// A single field in a compound index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub field: String,
    pub order: IndexSortOrder,
}

/// Simple or compound index on existing document fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIndex {
    pub name: String,
    pub fields: Vec<IndexField>,
    pub unique: bool,
}

impl FieldIndex {
    /// Field names in index order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }

    /// Compact description used in schema fingerprints, e.g. `idx_name(name:asc)`.
    pub fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                let dir = match f.order {
                    IndexSortOrder::Asc => "asc",
                    IndexSortOrder::Desc => "desc",
                };
                format!("{}:{dir}", f.field)
            })
            .collect();
        let unique = if self.unique { "!" } else { "" };
        format!("{}{unique}({})", self.name, fields.join(","))
    }
}
