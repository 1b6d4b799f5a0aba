//! Tests for schema validation.

use std::collections::BTreeMap;

use serde_json::json;
use wallet_db::{
    error::{SchemaError, WalletDbError},
    schema::{
        node::t,
        validate::{validate, validate_document},
    },
};

fn wallet_fields() -> BTreeMap<String, wallet_db::schema::node::SchemaNode> {
    BTreeMap::from([
        ("id".to_string(), t::key()),
        ("name".to_string(), t::string()),
        ("publicKey".to_string(), t::string()),
        ("secret".to_string(), t::string()),
    ])
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn scalar_types_accept_matching_values() {
    assert!(validate(&t::string(), &json!("x")).is_ok());
    assert!(validate(&t::number(), &json!(1.5)).is_ok());
    assert!(validate(&t::boolean(), &json!(true)).is_ok());
}

#[test]
fn scalar_type_mismatch_reports_expected_and_received() {
    let errs = validate(&t::string(), &json!(42)).unwrap_err();
    assert_eq!(errs.0.len(), 1);
    assert_eq!(errs.0[0].expected, "string");
    assert_eq!(errs.0[0].received, "number");
}

#[test]
fn key_rejects_empty_string() {
    let errs = validate(&t::key(), &json!("")).unwrap_err();
    assert_eq!(errs.0[0].received, "empty string");
}

#[test]
fn optional_accepts_null() {
    assert!(validate(&t::optional(t::string()), &json!(null)).is_ok());
    assert!(validate(&t::optional(t::string()), &json!(1)).is_err());
}

#[test]
fn array_errors_carry_element_index() {
    let errs = validate(&t::array(t::number()), &json!([1, "two", 3])).unwrap_err();
    assert_eq!(errs.0.len(), 1);
    assert_eq!(errs.0[0].path, "[1]");
}

#[test]
fn nested_object_paths_are_dotted() {
    let schema = t::object(BTreeMap::from([(
        "owner".to_string(),
        t::object(BTreeMap::from([("email".to_string(), t::string())])),
    )]));
    let errs = validate(&schema, &json!({ "owner": { "email": false } })).unwrap_err();
    assert_eq!(errs.0[0].path, "owner.email");
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn complete_wallet_document_is_valid() {
    let doc = json!({
        "id": "a1b2c",
        "name": "Wallet 1",
        "publicKey": "Public 1",
        "secret": "Secret 1",
    });
    assert!(validate_document(&wallet_fields(), &doc).is_ok());
}

#[test]
fn missing_required_field_is_reported_as_missing() {
    let doc = json!({ "id": "a1b2c", "name": "Wallet 1", "publicKey": "Public 1" });
    let err = validate_document(&wallet_fields(), &doc).unwrap_err();
    match err {
        WalletDbError::Schema(SchemaError::Validation(errs)) => {
            assert_eq!(errs.0.len(), 1);
            assert_eq!(errs.0[0].path, "secret");
            assert_eq!(errs.0[0].received, "missing");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn unknown_field_is_rejected() {
    let doc = json!({
        "id": "a1b2c",
        "name": "Wallet 1",
        "publicKey": "Public 1",
        "secret": "Secret 1",
        "balance": 10,
    });
    let err = validate_document(&wallet_fields(), &doc).unwrap_err();
    assert!(err.to_string().contains("balance"), "{err}");
}

#[test]
fn every_error_is_collected() {
    let doc = json!({ "id": 7, "name": null });
    let err = validate_document(&wallet_fields(), &doc).unwrap_err();
    match err {
        WalletDbError::Schema(SchemaError::Validation(errs)) => assert_eq!(errs.0.len(), 4),
        other => panic!("expected validation error, got {other:?}"),
    }
}
