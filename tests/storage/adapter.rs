//! Integration tests for `Adapter<SqliteBackend>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use wallet_db::{
    collection::builder::{collection, CollectionDef},
    error::{SchemaError, StorageError, WalletDbError},
    gateway::wallet_collection,
    query::types::Query,
    schema::node::t,
    storage::{adapter::Adapter, sqlite::SqliteBackend, traits::StorageBackend},
    types::{WriteMode, WriteOutcome},
};

// ============================================================================
// Helpers
// ============================================================================

/// Users with a unique email index.
fn users_def() -> CollectionDef {
    collection("users")
        .v(
            1,
            BTreeMap::from([
                ("id".to_string(), t::string()),
                ("name".to_string(), t::string()),
                ("email".to_string(), t::string()),
            ]),
        )
        .primary_key("id")
        .index_with(&["email"], Some("idx_email"), true)
        .build()
}

fn make_adapter(def: CollectionDef) -> (Adapter<SqliteBackend>, Arc<CollectionDef>) {
    let backend = SqliteBackend::open_in_memory().expect("open in-memory DB");
    let mut adapter = Adapter::new(backend);
    let def = adapter.register(Arc::new(def)).expect("register");
    (adapter, def)
}

fn wallet(id: &str, n: usize) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Wallet {n}"),
        "publicKey": format!("Public {n}"),
        "secret": format!("Secret {n}"),
    })
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn registering_same_definition_twice_is_idempotent() {
    let (mut adapter, def) = make_adapter(wallet_collection());
    let again = adapter.register(Arc::new(wallet_collection())).unwrap();
    assert_eq!(*again, *def);
}

#[test]
fn registering_different_definition_fails_with_mismatch() {
    let (mut adapter, _) = make_adapter(wallet_collection());
    let changed = collection("wallets")
        .v(1, BTreeMap::from([("id".to_string(), t::string())]))
        .primary_key("id")
        .build();
    let err = adapter.register(Arc::new(changed)).unwrap_err();
    match err {
        WalletDbError::Schema(SchemaError::Mismatch { collection, .. }) => {
            assert_eq!(collection, "wallets")
        }
        other => panic!("expected Mismatch, got {other:?}"),
    }
}

#[test]
fn unregistered_collection_is_rejected() {
    let (adapter, _) = make_adapter(wallet_collection());
    let err = adapter.count(&users_def(), None).unwrap_err();
    assert!(matches!(
        err,
        WalletDbError::Storage(StorageError::CollectionNotRegistered(_))
    ));
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn insert_then_get() {
    let (adapter, def) = make_adapter(wallet_collection());
    let (doc, outcome) = adapter.put(&def, wallet("a1b2c", 1), WriteMode::Insert).unwrap();
    assert_eq!(outcome, WriteOutcome::Inserted);
    assert_eq!(adapter.get(&def, "a1b2c").unwrap(), Some(doc));
}

#[test]
fn insert_rejects_invalid_document_and_stores_nothing() {
    let (adapter, def) = make_adapter(wallet_collection());
    let err = adapter
        .put(&def, json!({ "id": "a1b2c", "name": "Wallet 1" }), WriteMode::Insert)
        .unwrap_err();
    assert!(matches!(err, WalletDbError::Schema(SchemaError::Validation(_))));
    assert_eq!(adapter.count(&def, None).unwrap(), 0);
}

#[test]
fn duplicate_insert_fails_and_keeps_original() {
    let (adapter, def) = make_adapter(wallet_collection());
    adapter.put(&def, wallet("a1b2c", 1), WriteMode::Insert).unwrap();
    let err = adapter
        .put(&def, wallet("a1b2c", 2), WriteMode::Insert)
        .unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(adapter.count(&def, None).unwrap(), 1);
    assert_eq!(adapter.get(&def, "a1b2c").unwrap(), Some(wallet("a1b2c", 1)));
}

#[test]
fn upsert_replaces_existing() {
    let (adapter, def) = make_adapter(wallet_collection());
    let (_, first) = adapter.put(&def, wallet("a", 1), WriteMode::Upsert).unwrap();
    let (_, second) = adapter.put(&def, wallet("a", 2), WriteMode::Upsert).unwrap();
    assert_eq!(first, WriteOutcome::Inserted);
    assert_eq!(second, WriteOutcome::Replaced);
    assert_eq!(adapter.get(&def, "a").unwrap(), Some(wallet("a", 2)));
}

#[test]
fn unique_index_violation_rolls_back() {
    let (adapter, def) = make_adapter(users_def());
    adapter
        .put(&def, json!({ "id": "u1", "name": "Ann", "email": "a@x" }), WriteMode::Insert)
        .unwrap();
    let err = adapter
        .put(&def, json!({ "id": "u2", "name": "Bob", "email": "a@x" }), WriteMode::Insert)
        .unwrap_err();
    match err {
        WalletDbError::Storage(StorageError::UniqueConstraint { index, existing_id, value, .. }) => {
            assert_eq!(index, "idx_email");
            assert_eq!(existing_id, "u1");
            assert_eq!(value, json!("a@x"));
        }
        other => panic!("expected UniqueConstraint, got {other:?}"),
    }
    assert_eq!(adapter.count(&def, None).unwrap(), 1);
}

#[test]
fn upsert_of_same_record_keeps_its_unique_value() {
    let (adapter, def) = make_adapter(users_def());
    let doc = json!({ "id": "u1", "name": "Ann", "email": "a@x" });
    adapter.put(&def, doc.clone(), WriteMode::Insert).unwrap();
    assert!(adapter.put(&def, doc, WriteMode::Upsert).is_ok());
}

#[test]
fn delete_returns_removed_document() {
    let (adapter, def) = make_adapter(wallet_collection());
    adapter.put(&def, wallet("a", 1), WriteMode::Insert).unwrap();
    assert_eq!(adapter.delete(&def, "a").unwrap(), Some(wallet("a", 1)));
    assert_eq!(adapter.delete(&def, "a").unwrap(), None);
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn query_sorts_and_counts() {
    let (adapter, def) = make_adapter(wallet_collection());
    for (id, n) in [("c", 3), ("a", 1), ("b", 2)] {
        adapter.put(&def, wallet(id, n), WriteMode::Insert).unwrap();
    }
    let result = adapter.query(&def, &Query::all().sort_asc("name")).unwrap();
    let names: Vec<&str> = result.records.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Wallet 1", "Wallet 2", "Wallet 3"]);

    let filtered = Query::selector(json!({ "name": { "$in": ["Wallet 1", "Wallet 3"] } }));
    assert_eq!(adapter.count(&def, Some(&filtered)).unwrap(), 2);
    assert_eq!(adapter.count(&def, None).unwrap(), 3);
}

#[test]
fn registration_fingerprint_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallets.db");
    {
        let mut adapter = Adapter::new(SqliteBackend::open(&path).unwrap());
        adapter.register(Arc::new(wallet_collection())).unwrap();
    }
    let backend = SqliteBackend::open(&path).unwrap();
    assert_eq!(
        backend.get_meta("schema:wallets").unwrap(),
        Some(wallet_collection().fingerprint())
    );
}
