//! The wallet record and its collection definition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    collection::builder::{collection, CollectionDef},
    error::{Result, WalletDbError},
    schema::node::t,
};

/// Name of the collection wallets are stored in.
pub const WALLETS_COLLECTION: &str = "wallets";

/// A wallet record. Stored with camelCase field names (`publicKey`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub name: String,
    pub public_key: String,
    pub secret: String,
}

impl Wallet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        public_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            public_key: public_key.into(),
            secret: secret.into(),
        }
    }

    /// The `n`th generated wallet: `Wallet n`, `Public n`, `Secret n`.
    pub fn numbered(id: impl Into<String>, n: usize) -> Self {
        Self::new(
            id,
            format!("Wallet {n}"),
            format!("Public {n}"),
            format!("Secret {n}"),
        )
    }

    /// `"<name> screams: <WHAT>"`.
    pub fn convert(&self, what: &str) -> String {
        format!("{} screams: {}", self.name, what.to_uppercase())
    }

    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| WalletDbError::Internal(format!("serialize wallet: {e}")))
    }

    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc)
            .map_err(|e| WalletDbError::Internal(format!("malformed wallet document: {e}")))
    }
}

/// Definition of the `wallets` collection: every field required, `id` as
/// primary key, a secondary index on `name`.
pub fn wallet_collection() -> CollectionDef {
    collection(WALLETS_COLLECTION)
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
        .index(&["name"])
        .build()
}
