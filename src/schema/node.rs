use std::collections::BTreeMap;

// ============================================================================
// SchemaNode Types
// ============================================================================

/// A schema node describing the shape and type constraints of a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String,
    Number,
    Boolean,
    Optional(Box<SchemaNode>),
    Array(Box<SchemaNode>),
    Object(BTreeMap<String, SchemaNode>),
    /// Primary key: a non-empty string chosen by the client.
    Key,
}

// ============================================================================
// Schema Builder API (`t` module)
// ============================================================================

/// Schema builder helpers. Usage: `t::string()`, `t::optional(t::number())`, etc.
pub mod t {
    use super::SchemaNode;
    use std::collections::BTreeMap;

    pub fn string() -> SchemaNode {
        SchemaNode::String
    }

    pub fn number() -> SchemaNode {
        SchemaNode::Number
    }

    pub fn boolean() -> SchemaNode {
        SchemaNode::Boolean
    }

    pub fn optional(inner: SchemaNode) -> SchemaNode {
        SchemaNode::Optional(Box::new(inner))
    }

    pub fn array(element: SchemaNode) -> SchemaNode {
        SchemaNode::Array(Box::new(element))
    }

    pub fn object(properties: BTreeMap<String, SchemaNode>) -> SchemaNode {
        SchemaNode::Object(properties)
    }

    pub fn key() -> SchemaNode {
        SchemaNode::Key
    }
}

// ============================================================================
// Predicate Helpers
// ============================================================================

/// Returns true for types that can be stored in an index.
pub fn is_indexable_node(node: &SchemaNode) -> bool {
    matches!(
        node,
        SchemaNode::String | SchemaNode::Number | SchemaNode::Boolean | SchemaNode::Key
    )
}

/// Short lowercase name used in fingerprints and error messages.
pub fn node_name(node: &SchemaNode) -> String {
    match node {
        SchemaNode::String => "string".to_string(),
        SchemaNode::Number => "number".to_string(),
        SchemaNode::Boolean => "boolean".to_string(),
        SchemaNode::Key => "key".to_string(),
        SchemaNode::Optional(inner) => format!("optional<{}>", node_name(inner)),
        SchemaNode::Array(inner) => format!("array<{}>", node_name(inner)),
        SchemaNode::Object(props) => {
            let fields: Vec<String> = props
                .iter()
                .map(|(k, v)| format!("{k}:{}", node_name(v)))
                .collect();
            format!("object{{{}}}", fields.join(","))
        }
    }
}
