//! Selector operator evaluation for the query engine.
//! Implements a MongoDB-style subset: field equality, comparison operators,
//! membership, and `$and` / `$or`.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::{QueryError, Result, WalletDbError};

// ============================================================================
// Value Comparison
// ============================================================================

/// Compare two JSON values for ordering.
///
/// - Both Null → Equal
/// - a is Null → Greater (nulls sort to end)
/// - b is Null → Less
/// - Both numbers → f64 comparison (NaN treated as Equal)
/// - Both strings → lexicographic (codepoint order)
/// - Both booleans → false < true
/// - Cross-type → type rank: number(0), string(1), bool(2), other(3)
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(na), Value::Number(nb)) => {
            let fa = na.as_f64().unwrap_or(f64::NAN);
            let fb = nb.as_f64().unwrap_or(f64::NAN);
            fa.partial_cmp(&fb).unwrap_or(Ordering::Equal)
        }
        (Value::String(sa), Value::String(sb)) => sa.cmp(sb),
        (Value::Bool(ba), Value::Bool(bb)) => ba.cmp(bb),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        _ => 3,
    }
}

/// Returns true if `value` is a non-empty object where ALL keys start with `$`.
pub fn is_operator(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) if !obj.is_empty() => obj.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

// ============================================================================
// Field Path Resolution
// ============================================================================

/// Get a nested value from a record using a dot-separated path.
/// Returns `None` if any path segment is missing or the parent is not an object.
pub fn get_field_value<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

// ============================================================================
// Operator Evaluation
// ============================================================================

fn operand_array<'a>(op: &str, operand: &'a Value) -> Result<&'a Vec<Value>> {
    operand.as_array().ok_or_else(|| {
        WalletDbError::Query(QueryError::InvalidOperand {
            operator: op.to_string(),
            expected: "an array".to_string(),
        })
    })
}

/// Evaluate a single operator against a field value.
fn evaluate_operator(value: &Value, op: &str, operand: &Value) -> Result<bool> {
    match op {
        "$eq" => Ok(value == operand),

        "$ne" => Ok(value != operand),

        "$gt" | "$gte" | "$lt" | "$lte" => {
            if value.is_null() || operand.is_null() {
                return Ok(false);
            }
            let cmp = compare_values(value, operand);
            Ok(match op {
                "$gt" => cmp == Ordering::Greater,
                "$gte" => cmp != Ordering::Less,
                "$lt" => cmp == Ordering::Less,
                _ => cmp != Ordering::Greater,
            })
        }

        "$in" => Ok(operand_array(op, operand)?.iter().any(|item| item == value)),

        "$nin" => Ok(!operand_array(op, operand)?.iter().any(|item| item == value)),

        other => Err(WalletDbError::Query(QueryError::UnknownOperator(
            other.to_string(),
        ))),
    }
}

/// Evaluate an operator object `{ $op: operand, ... }` against a value.
fn evaluate_operators(value: &Value, ops: &Map<String, Value>) -> Result<bool> {
    for (op, operand) in ops {
        if !evaluate_operator(value, op, operand)? {
            return Ok(false);
        }
    }
    Ok(true)
}

// ============================================================================
// Filter Evaluation
// ============================================================================

/// Evaluate a MongoDB-style selector against a record.
///
/// `$and` / `$or` are evaluated first; remaining keys are field conditions
/// (implicit AND). A field condition is either a literal (equality) or an
/// operator object. A missing field compares as `null`.
pub fn matches_filter(record: &Value, filter: &Value) -> Result<bool> {
    let Some(filter_obj) = filter.as_object() else {
        return Ok(true);
    };

    for (key, condition) in filter_obj {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in operand_array(key, condition)? {
                    if !matches_filter(record, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for sub in operand_array(key, condition)? {
                    if matches_filter(record, sub)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            op if op.starts_with('$') => {
                return Err(WalletDbError::Query(QueryError::UnknownOperator(
                    op.to_string(),
                )))
            }
            field => {
                let value = get_field_value(record, field).unwrap_or(&Value::Null);
                match condition.as_object() {
                    Some(ops) if is_operator(condition) => evaluate_operators(value, ops)?,
                    _ => value == condition,
                }
            }
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Keep the records matching `filter`, preserving order.
pub fn filter_records(records: Vec<Value>, filter: &Value) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if matches_filter(&record, filter)? {
            out.push(record);
        }
    }
    Ok(out)
}
