//! Adapter<B>: orchestration layer that adds collection semantics on top of
//! any `StorageBackend`.
//!
//! The adapter handles collection registration, schema validation, primary
//! key and unique-index checks, and query execution. All raw I/O is delegated
//! to the backend.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    collection::builder::{CollectionDef, PRIMARY_INDEX},
    error::{Result, SchemaError, StorageError, WalletDbError},
    query::{execute::execute_query, types::Query},
    schema::validate::validate_document,
    storage::traits::StorageBackend,
    types::{QueryResult, WriteMode, WriteOutcome},
};

// ============================================================================
// Metadata Keys
// ============================================================================

/// Prefix for per-collection schema fingerprints (`"schema:{collection}"`).
const META_SCHEMA_PREFIX: &str = "schema:";

// ============================================================================
// Adapter Struct
// ============================================================================

/// Orchestration layer that wraps a `StorageBackend` with collection-aware
/// reads and writes.
pub struct Adapter<B: StorageBackend> {
    pub(crate) backend: B,
    collections: Vec<Arc<CollectionDef>>,
}

impl<B: StorageBackend> Adapter<B> {
    /// Create a new adapter wrapping `backend`. No collections are registered.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            collections: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register `def`, creating backend indexes and recording its fingerprint.
    ///
    /// Registering an identical definition twice (in this adapter, or in an
    /// earlier process against the same file) is a no-op. A definition whose
    /// fingerprint differs from the stored one fails with
    /// `SchemaError::Mismatch`.
    pub fn register(&mut self, def: Arc<CollectionDef>) -> Result<Arc<CollectionDef>> {
        let requested = def.fingerprint();
        let meta_key = format!("{META_SCHEMA_PREFIX}{}", def.name);

        if let Some(stored) = self.backend.get_meta(&meta_key)? {
            if stored != requested {
                return Err(SchemaError::Mismatch {
                    collection: def.name.clone(),
                    stored,
                    requested,
                }
                .into());
            }
        }

        if let Some(existing) = self.collection_def(&def.name) {
            return Ok(Arc::clone(existing));
        }

        self.backend.register_collection(&def)?;
        self.backend.set_meta(&meta_key, &requested)?;
        tracing::debug!(collection = %def.name, fingerprint = %requested, "collection registered");
        self.collections.push(Arc::clone(&def));
        Ok(def)
    }

    /// Look up the registered `CollectionDef` for a collection name.
    pub fn collection_def(&self, name: &str) -> Option<&Arc<CollectionDef>> {
        self.collections.iter().find(|c| c.name == name)
    }

    fn check_registered(&self, def: &CollectionDef) -> Result<()> {
        if self.collection_def(&def.name).is_none() {
            return Err(StorageError::CollectionNotRegistered(def.name.clone()).into());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetch one document by primary key.
    pub fn get(&self, def: &CollectionDef, id: &str) -> Result<Option<Value>> {
        self.check_registered(def)?;
        Ok(self.backend.get_raw(&def.name, id)?.map(|r| r.data))
    }

    /// Run `query` over the whole collection.
    pub fn query(&self, def: &CollectionDef, query: &Query) -> Result<QueryResult> {
        self.check_registered(def)?;
        let raw = self.backend.scan_raw(&def.name)?;
        let docs: Vec<Value> = raw.records.into_iter().map(|r| r.data).collect();
        execute_query(docs, query)
    }

    /// Count documents, optionally restricted by a selector.
    pub fn count(&self, def: &CollectionDef, query: Option<&Query>) -> Result<usize> {
        self.check_registered(def)?;
        match query.and_then(|q| q.filter.clone()) {
            None => self.backend.count_raw(&def.name),
            Some(filter) => Ok(self.query(def, &Query::selector(filter))?.total),
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Validate and write `doc`.
    ///
    /// The primary-key check, unique-index checks, and the write itself run
    /// in one backend transaction, so a rejected write leaves nothing behind.
    pub fn put(
        &self,
        def: &CollectionDef,
        doc: Value,
        mode: WriteMode,
    ) -> Result<(Value, WriteOutcome)> {
        self.check_registered(def)?;
        validate_document(&def.fields, &doc)?;

        let id = doc
            .get(&def.primary_key)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WalletDbError::Internal(format!(
                    "validated document has no string primary key \"{}\"",
                    def.primary_key
                ))
            })?
            .to_string();

        self.backend.transaction(|backend| {
            let exists = backend.get_raw(&def.name, &id)?.is_some();

            if exists && mode == WriteMode::Insert {
                return Err(StorageError::UniqueConstraint {
                    collection: def.name.clone(),
                    index: PRIMARY_INDEX.to_string(),
                    existing_id: id.clone(),
                    value: Value::String(id.clone()),
                }
                .into());
            }

            for index in def.unique_indexes() {
                backend.check_unique(&def.name, index, &doc, Some(&id))?;
            }

            if exists {
                backend
                    .replace_raw(&def.name, &id, &doc)?
                    .ok_or_else(|| StorageError::NotFound {
                        collection: def.name.clone(),
                        id: id.clone(),
                    })?;
                Ok(WriteOutcome::Replaced)
            } else {
                backend.insert_raw(&def.name, &id, &doc)?;
                Ok(WriteOutcome::Inserted)
            }
        })
        .map(|outcome| (doc, outcome))
    }

    /// Remove a document by primary key, returning what was stored.
    pub fn delete(&self, def: &CollectionDef, id: &str) -> Result<Option<Value>> {
        self.check_registered(def)?;
        Ok(self.backend.delete_raw(&def.name, id)?.map(|r| r.data))
    }
}
