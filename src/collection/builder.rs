//! Collection builder with a fluent API.
//!
//! A collection has one schema version, one primary key field, and any
//! number of field indexes. Fields that are not wrapped in `t::optional()`
//! are required.

use std::{collections::BTreeMap, sync::OnceLock};

use crate::{
    index::types::{FieldIndex, IndexField, IndexSortOrder},
    schema::node::{is_indexable_node, node_name, SchemaNode},
};

// ============================================================================
// Regex
// ============================================================================

static NAME_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn name_regex() -> &'static regex::Regex {
    NAME_REGEX.get_or_init(|| {
        regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("name regex is valid")
    })
}

/// Name reported in unique-constraint errors raised by the primary key.
pub const PRIMARY_INDEX: &str = "primary";

// ============================================================================
// Public Types
// ============================================================================

/// Complete collection definition produced by `build()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDef {
    pub name: String,
    pub version: u32,
    pub primary_key: String,
    /// Full field map; the primary key field is `SchemaNode::Key`.
    pub fields: BTreeMap<String, SchemaNode>,
    pub indexes: Vec<FieldIndex>,
}

impl CollectionDef {
    /// Names of the fields every document must carry.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, node)| !matches!(node, SchemaNode::Optional(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Unique indexes other than the primary key.
    pub fn unique_indexes(&self) -> impl Iterator<Item = &FieldIndex> {
        self.indexes.iter().filter(|idx| idx.unique)
    }

    /// Stable textual fingerprint of everything that affects storage layout.
    ///
    /// Two definitions with the same fingerprint may share a database.
    pub fn fingerprint(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}:{}", node_name(v)))
            .collect();
        let indexes: Vec<String> = self.indexes.iter().map(FieldIndex::describe).collect();
        format!(
            "v{};pk={};fields=[{}];indexes=[{}]",
            self.version,
            self.primary_key,
            fields.join(","),
            indexes.join(",")
        )
    }
}

// ============================================================================
// Builder: No Schema Yet
// ============================================================================

/// Initial collection builder: awaiting its schema.
pub struct CollectionBuilderNoSchema {
    name: String,
}

impl CollectionBuilderNoSchema {
    /// Define the schema version and field map.
    /// Panics if schema contains invalid field names.
    pub fn v(self, version: u32, schema: BTreeMap<String, SchemaNode>) -> CollectionBuilderNoKey {
        validate_user_schema(&schema, &self.name);
        CollectionBuilderNoKey {
            name: self.name,
            version,
            fields: schema,
        }
    }
}

// ============================================================================
// Builder: Schema, No Primary Key
// ============================================================================

/// Collection builder with a schema, awaiting its primary key.
pub struct CollectionBuilderNoKey {
    name: String,
    version: u32,
    fields: BTreeMap<String, SchemaNode>,
}

impl CollectionBuilderNoKey {
    /// Mark `field` as the primary key.
    /// Panics if the field is unknown, optional, or not a string.
    pub fn primary_key(mut self, field: &str) -> CollectionBuilder {
        match self.fields.get(field) {
            Some(SchemaNode::String) | Some(SchemaNode::Key) => {}
            Some(other) => panic!(
                "Primary key \"{field}\" in collection \"{}\" must be a required string, got {}",
                self.name,
                node_name(other)
            ),
            None => panic!(
                "Primary key references unknown field \"{field}\" in collection \"{}\"",
                self.name
            ),
        }
        self.fields.insert(field.to_string(), SchemaNode::Key);

        CollectionBuilder {
            name: self.name,
            version: self.version,
            primary_key: field.to_string(),
            fields: self.fields,
            indexes: vec![],
        }
    }
}

// ============================================================================
// Builder: Complete Shape
// ============================================================================

/// Collection builder after schema and primary key have been defined.
pub struct CollectionBuilder {
    name: String,
    version: u32,
    primary_key: String,
    fields: BTreeMap<String, SchemaNode>,
    indexes: Vec<FieldIndex>,
}

impl CollectionBuilder {
    /// Define a field index with default options (not unique).
    /// Panics on invalid or unknown fields.
    pub fn index(self, fields: &[&str]) -> Self {
        self.index_with(fields, None, false)
    }

    /// Define a field index with explicit options.
    /// Panics on validation errors.
    pub fn index_with(mut self, fields: &[&str], name: Option<&str>, unique: bool) -> Self {
        assert!(!fields.is_empty(), "Index must have at least one field");

        let index_fields: Vec<IndexField> = fields
            .iter()
            .map(|&f| IndexField {
                field: f.to_string(),
                order: IndexSortOrder::Asc,
            })
            .collect();

        let index_name = match name {
            Some(n) => {
                if !name_regex().is_match(n) {
                    panic!(
                        "Index name \"{n}\" in collection \"{}\" contains invalid characters. \
                         Index names must start with a letter or underscore and contain only \
                         alphanumeric characters and underscores.",
                        self.name
                    );
                }
                n.to_string()
            }
            None => format!("idx_{}", fields.join("_")),
        };

        if index_name == PRIMARY_INDEX || self.indexes.iter().any(|idx| idx.name == index_name) {
            panic!(
                "Index \"{index_name}\" already defined on collection \"{}\"",
                self.name
            );
        }

        for field in &index_fields {
            let field_name = &field.field;
            let schema_node = self.fields.get(field_name).unwrap_or_else(|| {
                panic!(
                    "Index \"{index_name}\" references unknown field \"{field_name}\" \
                     in collection \"{}\"",
                    self.name
                )
            });

            if !is_indexable_node(unwrap_optional(schema_node)) {
                panic!(
                    "Index \"{index_name}\" field \"{field_name}\" has non-indexable type \
                     in collection \"{}\"",
                    self.name
                );
            }
        }

        self.indexes.push(FieldIndex {
            name: index_name,
            fields: index_fields,
            unique,
        });
        self
    }

    /// Finalize the collection definition.
    pub fn build(self) -> CollectionDef {
        CollectionDef {
            name: self.name,
            version: self.version,
            primary_key: self.primary_key,
            fields: self.fields,
            indexes: self.indexes,
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Create a new collection builder.
/// Panics if name is empty or contains invalid characters.
pub fn collection(name: &str) -> CollectionBuilderNoSchema {
    if name.trim().is_empty() {
        panic!("Collection name cannot be empty");
    }
    if !name_regex().is_match(name) {
        panic!(
            "Collection name \"{name}\" contains invalid characters. \
             Collection names must start with a letter or underscore and contain \
             only alphanumeric characters and underscores."
        );
    }
    CollectionBuilderNoSchema {
        name: name.to_string(),
    }
}

// ============================================================================
// Internal Helpers
// ============================================================================

fn validate_user_schema(schema: &BTreeMap<String, SchemaNode>, collection_name: &str) {
    assert!(
        !schema.is_empty(),
        "Collection \"{collection_name}\" must define at least one field"
    );
    for key in schema.keys() {
        if !name_regex().is_match(key) {
            panic!(
                "Field name \"{key}\" in collection \"{collection_name}\" contains invalid characters. \
                 Field names must start with a letter or underscore and contain only \
                 alphanumeric characters and underscores."
            );
        }
    }
}

/// Unwrap Optional to get the inner node for indexability checking.
fn unwrap_optional(node: &SchemaNode) -> &SchemaNode {
    match node {
        SchemaNode::Optional(inner) => inner.as_ref(),
        other => other,
    }
}
