//! Query execution engine: scan-and-filter with sorting and pagination.

use serde_json::Value;

use crate::error::Result;
use crate::types::QueryResult;

use super::operators::{compare_values, filter_records, get_field_value};
use super::types::{normalize_sort, Query, SortDirection, SortEntry};

// ============================================================================
// Sorting
// ============================================================================

/// Sort records by multiple fields with cascading priority.
///
/// The sort is stable: records that compare equal on every entry keep their
/// input order, which callers rely on for insertion-order tie-breaking.
pub fn sort_records(mut records: Vec<Value>, sort: &[SortEntry]) -> Vec<Value> {
    if sort.is_empty() {
        return records;
    }

    records.sort_by(|a, b| {
        for entry in sort {
            let va = get_field_value(a, &entry.field).unwrap_or(&Value::Null);
            let vb = get_field_value(b, &entry.field).unwrap_or(&Value::Null);
            let cmp = compare_values(va, vb);
            if cmp != std::cmp::Ordering::Equal {
                return if entry.direction == SortDirection::Desc {
                    cmp.reverse()
                } else {
                    cmp
                };
            }
        }
        std::cmp::Ordering::Equal
    });

    records
}

// ============================================================================
// Pagination
// ============================================================================

/// Apply offset then limit to a list of records.
pub fn paginate_records(
    records: Vec<Value>,
    offset: Option<usize>,
    limit: Option<usize>,
) -> Vec<Value> {
    let skipped = records.into_iter().skip(offset.unwrap_or(0));
    match limit {
        Some(n) => skipped.take(n).collect(),
        None => skipped.collect(),
    }
}

// ============================================================================
// Query Execution
// ============================================================================

/// Execute a query against records supplied in insertion order.
///
/// 1. Apply filter (if present).
/// 2. Capture total count (after filter, before pagination).
/// 3. Sort.
/// 4. Paginate (offset then limit).
pub fn execute_query(records: Vec<Value>, query: &Query) -> Result<QueryResult> {
    let filtered = match &query.filter {
        Some(filter) => filter_records(records, filter)?,
        None => records,
    };

    let total = filtered.len();

    let sorted = match normalize_sort(query.sort.clone()) {
        Some(entries) => sort_records(filtered, &entries),
        None => filtered,
    };

    Ok(QueryResult {
        records: paginate_records(sorted, query.offset, query.limit),
        total,
    })
}

// ============================================================================
// Tests
// ============================================================================
