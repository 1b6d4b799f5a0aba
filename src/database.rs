//! Named database instances and per-collection handles.
//!
//! A process-wide registry tracks which database names are open. Opening a
//! name that is already open either shares the live instance (when the
//! config sets `ignore_duplicate`) or fails with
//! `StorageError::DuplicateDatabase`. The name is released when the last
//! handle to the instance drops.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    collection::builder::CollectionDef,
    config::{GatewayConfig, StorageLocation},
    error::{Result, StorageError},
    query::types::Query,
    reactive::{
        adapter::{ReactiveAdapter, Unsubscribe},
        event::ChangeEvent,
        stream::ChangeStream,
    },
    storage::{adapter::Adapter, sqlite::SqliteBackend},
};

// ============================================================================
// Registry
// ============================================================================

type Registry = Mutex<HashMap<String, Weak<DatabaseInner>>>;

static OPEN_DATABASES: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    OPEN_DATABASES.get_or_init(|| Mutex::new(HashMap::new()))
}

static DB_NAME_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn db_name_regex() -> &'static regex::Regex {
    DB_NAME_REGEX.get_or_init(|| {
        regex::Regex::new(r"^[a-z][a-z0-9_$()+/-]*$").expect("database name regex is valid")
    })
}

/// True if `name` is acceptable as a database name.
pub fn is_valid_database_name(name: &str) -> bool {
    db_name_regex().is_match(name)
}

// ============================================================================
// Database
// ============================================================================

struct DatabaseInner {
    name: String,
    storage: StorageLocation,
    adapter: ReactiveAdapter<SqliteBackend>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut open = registry().lock();
        // A replacement may already hold the slot; only clear a dead entry.
        if open
            .get(&self.name)
            .is_some_and(|weak| weak.strong_count() == 0)
        {
            open.remove(&self.name);
        }
        tracing::debug!(name = %self.name, "database closed");
    }
}

/// Handle to an open database. Clones share the same instance.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("storage", &self.inner.storage)
            .finish()
    }
}

impl Database {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &GatewayConfig) -> Result<Self> {
        if !is_valid_database_name(&config.name) {
            return Err(StorageError::InvalidDatabaseName(config.name.clone()).into());
        }

        let mut open = registry().lock();

        if let Some(weak) = open.get(&config.name) {
            if weak.strong_count() > 0 {
                if !config.ignore_duplicate {
                    return Err(StorageError::DuplicateDatabase(config.name.clone()).into());
                }
                if let Some(inner) = weak.upgrade() {
                    if inner.storage != config.storage {
                        tracing::warn!(
                            name = %config.name,
                            open = ?inner.storage,
                            requested = ?config.storage,
                            "database already open with different storage; sharing the open instance"
                        );
                    }
                    tracing::debug!(name = %config.name, "sharing already-open database");
                    return Ok(Self { inner });
                }
            }
        }

        let backend = match &config.storage {
            StorageLocation::Memory => SqliteBackend::open_in_memory()?,
            StorageLocation::File(path) => SqliteBackend::open(path)?,
        };
        let inner = Arc::new(DatabaseInner {
            name: config.name.clone(),
            storage: config.storage.clone(),
            adapter: ReactiveAdapter::new(Adapter::new(backend)),
        });
        open.insert(config.name.clone(), Arc::downgrade(&inner));
        tracing::info!(name = %config.name, storage = ?config.storage, "database opened");

        Ok(Self { inner })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn storage(&self) -> &StorageLocation {
        &self.inner.storage
    }

    /// Register a collection and return a handle to it.
    ///
    /// Registering the same definition again returns the existing handle; a
    /// different definition under the same name fails with
    /// `SchemaError::Mismatch`.
    pub fn add_collection(&self, def: CollectionDef) -> Result<Collection> {
        let def = self.inner.adapter.register(def)?;
        Ok(Collection {
            db: Arc::clone(&self.inner),
            def,
        })
    }

    /// Handle to a previously registered collection.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        let def = self
            .inner
            .adapter
            .collection_def(name)
            .ok_or_else(|| StorageError::CollectionNotRegistered(name.to_string()))?;
        Ok(Collection {
            db: Arc::clone(&self.inner),
            def,
        })
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Handle to one registered collection. Keeps its database open.
#[derive(Clone)]
pub struct Collection {
    db: Arc<DatabaseInner>,
    def: Arc<CollectionDef>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("database", &self.db.name)
            .field("name", &self.def.name)
            .finish()
    }
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &CollectionDef {
        &self.def
    }

    /// Documents matching `query`, sorted and paginated as it requests.
    pub fn find(&self, query: &Query) -> Result<Vec<Value>> {
        Ok(self.db.adapter.query(&self.def, query)?.records)
    }

    /// Document with primary key `id`, if any.
    pub fn find_one(&self, id: &str) -> Result<Option<Value>> {
        self.db.adapter.get(&self.def, id)
    }

    /// Number of documents in the collection.
    pub fn count(&self) -> Result<usize> {
        self.db.adapter.count(&self.def, None)
    }

    /// Number of documents matching `query`'s selector.
    pub fn count_matching(&self, query: &Query) -> Result<usize> {
        self.db.adapter.count(&self.def, Some(query))
    }

    /// Insert a new document; fails if its primary key or any unique index
    /// value is taken.
    pub fn insert(&self, doc: Value) -> Result<Value> {
        self.db.adapter.insert(&self.def, doc)
    }

    pub fn upsert(&self, doc: Value) -> Result<Value> {
        self.db.adapter.upsert(&self.def, doc)
    }

    /// Remove the document with primary key `id`, returning it.
    pub fn remove(&self, id: &str) -> Result<Option<Value>> {
        self.db.adapter.remove(&self.def, id)
    }

    /// Live stream of this collection's change events.
    pub fn changes(&self) -> ChangeStream {
        self.db.adapter.changes(&self.def.name)
    }

    /// Call `callback` synchronously for each change to this collection.
    pub fn on_change(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> Unsubscribe {
        let name = self.def.name.clone();
        self.db.adapter.on_change(move |event| {
            if event.collection() == name {
                callback(event);
            }
        })
    }
}
