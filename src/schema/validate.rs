use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{SchemaError, ValidationError, ValidationErrors, WalletDbError};

use super::node::{node_name, SchemaNode};

// ============================================================================
// Validation Context
// ============================================================================

struct ValidationContext {
    errors: Vec<ValidationError>,
    path: Vec<String>,
}

impl ValidationContext {
    fn new() -> Self {
        Self {
            errors: vec![],
            path: vec![],
        }
    }

    fn push_key(&mut self, key: impl Into<String>) {
        self.path.push(key.into());
    }

    fn push_index(&mut self, idx: usize) {
        self.path.push(format!("[{idx}]"));
    }

    fn pop(&mut self) {
        self.path.pop();
    }

    /// Join path segments, collapsing `".[0]"` → `"[0]"`.
    fn current_path(&self) -> String {
        self.path.join(".").replace(".[", "[")
    }

    fn add_error(&mut self, expected: impl Into<String>, received: impl Into<String>) {
        self.errors.push(ValidationError {
            path: self.current_path(),
            expected: expected.into(),
            received: received.into(),
        });
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const MAX_DEPTH: usize = 100;

// ============================================================================
// Core Walker
// ============================================================================

/// Walk the schema tree and collect errors into `ctx`.
///
/// A missing field is passed in as `None` so that "missing" and "null" can be
/// reported differently.
fn walk(schema: &SchemaNode, value: Option<&Value>, ctx: &mut ValidationContext, depth: usize) {
    if depth > MAX_DEPTH {
        ctx.add_error(format!("nesting depth <= {MAX_DEPTH}"), "deeper value");
        return;
    }

    let value = match (schema, value) {
        (SchemaNode::Optional(_), None) => return,
        (_, None) => {
            ctx.add_error(node_name(schema), "missing");
            return;
        }
        (_, Some(v)) => v,
    };

    match schema {
        SchemaNode::String => {
            if !value.is_string() {
                ctx.add_error("string", type_name(value));
            }
        }

        SchemaNode::Number => {
            if !value.is_number() {
                ctx.add_error("number", type_name(value));
            }
        }

        SchemaNode::Boolean => {
            if !value.is_boolean() {
                ctx.add_error("boolean", type_name(value));
            }
        }

        SchemaNode::Key => match value.as_str() {
            Some(s) if !s.is_empty() => {}
            Some(_) => ctx.add_error("non-empty string (key)", "empty string"),
            None => ctx.add_error("non-empty string (key)", type_name(value)),
        },

        SchemaNode::Optional(inner) => {
            if !value.is_null() {
                walk(inner, Some(value), ctx, depth + 1);
            }
        }

        SchemaNode::Array(element) => match value.as_array() {
            None => ctx.add_error("array", type_name(value)),
            Some(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    ctx.push_index(i);
                    walk(element, Some(item), ctx, depth + 1);
                    ctx.pop();
                }
            }
        },

        SchemaNode::Object(props) => walk_object(props, value, ctx, depth),
    }
}

fn walk_object(
    props: &BTreeMap<String, SchemaNode>,
    value: &Value,
    ctx: &mut ValidationContext,
    depth: usize,
) {
    let Some(map) = value.as_object() else {
        ctx.add_error("object", type_name(value));
        return;
    };

    for (key, prop_schema) in props {
        ctx.push_key(key);
        walk(prop_schema, map.get(key), ctx, depth + 1);
        ctx.pop();
    }

    // Documents are closed: unknown fields are rejected.
    for key in map.keys() {
        if !props.contains_key(key) {
            ctx.push_key(key);
            ctx.add_error("no such field", type_name(&map[key]));
            ctx.pop();
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate `value` against `schema`.
pub fn validate(schema: &SchemaNode, value: &Value) -> Result<(), ValidationErrors> {
    let mut ctx = ValidationContext::new();
    walk(schema, Some(value), &mut ctx, 0);
    if ctx.errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(ctx.errors))
    }
}

/// Validate a top-level document against a collection's field map.
pub fn validate_document(
    fields: &BTreeMap<String, SchemaNode>,
    value: &Value,
) -> Result<(), WalletDbError> {
    let mut ctx = ValidationContext::new();
    walk_object(fields, value, &mut ctx, 0);
    if ctx.errors.is_empty() {
        Ok(())
    } else {
        Err(WalletDbError::Schema(SchemaError::Validation(ValidationErrors(
            ctx.errors,
        ))))
    }
}
