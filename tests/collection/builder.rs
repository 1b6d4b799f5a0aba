//! Tests for the collection builder and definition fingerprints.

use std::collections::BTreeMap;

use wallet_db::{
    collection::builder::collection,
    gateway::wallet_collection,
    schema::node::{t, SchemaNode},
};

fn fields() -> BTreeMap<String, SchemaNode> {
    BTreeMap::from([
        ("id".to_string(), t::string()),
        ("name".to_string(), t::string()),
        ("nickname".to_string(), t::optional(t::string())),
    ])
}

#[test]
fn primary_key_becomes_key_node() {
    let def = collection("people").v(0, fields()).primary_key("id").build();
    assert_eq!(def.primary_key, "id");
    assert_eq!(def.fields["id"], SchemaNode::Key);
}

#[test]
fn optional_fields_are_not_required() {
    let def = collection("people").v(0, fields()).primary_key("id").build();
    assert_eq!(def.required_fields(), vec!["id", "name"]);
}

#[test]
fn default_index_name_joins_fields() {
    let def = collection("people")
        .v(0, fields())
        .primary_key("id")
        .index(&["name"])
        .build();
    assert_eq!(def.indexes[0].name, "idx_name");
    assert!(!def.indexes[0].unique);
    assert_eq!(def.unique_indexes().count(), 0);
}

#[test]
fn unique_index_is_listed() {
    let def = collection("people")
        .v(0, fields())
        .primary_key("id")
        .index_with(&["name"], Some("by_name"), true)
        .build();
    let unique: Vec<_> = def.unique_indexes().map(|i| i.name.as_str()).collect();
    assert_eq!(unique, vec!["by_name"]);
}

#[test]
fn fingerprint_is_stable_and_sensitive_to_layout() {
    let a = wallet_collection();
    let b = wallet_collection();
    assert_eq!(a.fingerprint(), b.fingerprint());

    let without_index = collection("wallets")
        .v(
            0,
            BTreeMap::from([
                ("id".to_string(), t::string()),
                ("name".to_string(), t::string()),
                ("publicKey".to_string(), t::string()),
                ("secret".to_string(), t::string()),
            ]),
        )
        .primary_key("id")
        .build();
    assert_ne!(a.fingerprint(), without_index.fingerprint());
}

#[test]
fn fingerprint_mentions_version_and_primary_key() {
    let fp = wallet_collection().fingerprint();
    assert!(fp.starts_with("v0;pk=id;"), "{fp}");
    assert!(fp.contains("publicKey:string"), "{fp}");
    assert!(fp.contains("idx_name(name:asc)"), "{fp}");
}

#[test]
#[should_panic(expected = "invalid characters")]
fn collection_name_is_checked() {
    collection("bad-name");
}

#[test]
#[should_panic(expected = "unknown field")]
fn primary_key_must_exist() {
    collection("people").v(0, fields()).primary_key("missing");
}

#[test]
#[should_panic(expected = "must be a required string")]
fn optional_primary_key_is_rejected() {
    collection("people").v(0, fields()).primary_key("nickname");
}

#[test]
#[should_panic(expected = "already defined")]
fn duplicate_index_name_is_rejected() {
    collection("people")
        .v(0, fields())
        .primary_key("id")
        .index(&["name"])
        .index(&["name"]);
}

#[test]
#[should_panic(expected = "unknown field")]
fn index_on_unknown_field_is_rejected() {
    collection("people")
        .v(0, fields())
        .primary_key("id")
        .index(&["email"]);
}
