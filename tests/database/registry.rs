//! Tests for named database opening and the duplicate policy.

use wallet_db::{
    error::{SchemaError, StorageError, WalletDbError},
    gateway::{id::random_id, wallet_collection},
    Database, GatewayConfig, StorageLocation,
};

fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", random_id())
}

#[test]
fn invalid_names_are_rejected() {
    for name in ["", "Wallets", "1wallets", "wal lets"] {
        let err = Database::open(&GatewayConfig::in_memory(name)).unwrap_err();
        assert!(
            matches!(err, WalletDbError::Storage(StorageError::InvalidDatabaseName(_))),
            "{name:?} should be rejected"
        );
    }
}

#[test]
fn second_open_shares_instance_when_ignoring_duplicates() {
    let name = unique_name("shared");
    let config = GatewayConfig::in_memory(&name);
    let first = Database::open(&config).unwrap();
    let wallets = first.add_collection(wallet_collection()).unwrap();
    wallets
        .insert(serde_json::json!({
            "id": "a1b2c",
            "name": "Wallet 1",
            "publicKey": "Public 1",
            "secret": "Secret 1",
        }))
        .unwrap();

    let second = Database::open(&config).unwrap();
    let shared = second.collection("wallets").unwrap();
    assert_eq!(shared.count().unwrap(), 1);
}

#[test]
fn second_open_fails_without_ignore_duplicate() {
    let name = unique_name("strict");
    let config = GatewayConfig::in_memory(&name).with_ignore_duplicate(false);
    let _first = Database::open(&config).unwrap();
    let err = Database::open(&config).unwrap_err();
    match err {
        WalletDbError::Storage(StorageError::DuplicateDatabase(n)) => assert_eq!(n, name),
        other => panic!("expected DuplicateDatabase, got {other:?}"),
    }
}

#[test]
fn name_is_released_when_last_handle_drops() {
    let name = unique_name("released");
    let config = GatewayConfig::in_memory(&name).with_ignore_duplicate(false);
    {
        let db = Database::open(&config).unwrap();
        let _wallets = db.add_collection(wallet_collection()).unwrap();
    }
    let reopened = Database::open(&config).unwrap();
    // In-memory contents went away with the first instance.
    assert!(reopened.collection("wallets").is_err());
}

#[test]
fn collection_handle_keeps_database_open() {
    let name = unique_name("held");
    let config = GatewayConfig::in_memory(&name).with_ignore_duplicate(false);
    let wallets = Database::open(&config)
        .unwrap()
        .add_collection(wallet_collection())
        .unwrap();
    assert!(Database::open(&config).is_err());
    drop(wallets);
    assert!(Database::open(&config).is_ok());
}

#[test]
fn reported_name_and_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.db");
    let name = unique_name("named");
    let db = Database::open(&GatewayConfig::file(&name, &path)).unwrap();
    assert_eq!(db.name(), name);
    assert_eq!(db.storage(), &StorageLocation::File(path));
}

#[test]
fn schema_mismatch_on_file_database_is_reported() {
    use std::collections::BTreeMap;
    use wallet_db::{collection::builder::collection, schema::node::t};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallets.db");
    let name = unique_name("mismatch");
    {
        let db = Database::open(&GatewayConfig::file(&name, &path)).unwrap();
        db.add_collection(wallet_collection()).unwrap();
    }

    let db = Database::open(&GatewayConfig::file(&name, &path)).unwrap();
    let other = collection("wallets")
        .v(1, BTreeMap::from([("id".to_string(), t::string())]))
        .primary_key("id")
        .build();
    let err = db.add_collection(other).unwrap_err();
    assert!(matches!(err, WalletDbError::Schema(SchemaError::Mismatch { .. })));
    // The stored definition still registers cleanly.
    assert!(db.add_collection(wallet_collection()).is_ok());
}
