//! ReactiveAdapter<B>: wraps `Adapter<B>` and notifies listeners after every
//! successful write.
//!
//! # Threading model
//!
//! `ReactiveAdapter<B>` is `Send + Sync`. Two independent locks are used:
//!   - `inner`: the wrapped `Adapter<B>` (`parking_lot::Mutex`).
//!   - `emitter`: the change-event emitter, which releases its own lock
//!     before firing callbacks.
//!
//! Events are emitted after `inner` is released, so a listener may read from
//! the adapter without deadlocking.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    collection::builder::CollectionDef,
    error::Result,
    query::types::Query,
    storage::{adapter::Adapter, traits::StorageBackend},
    types::{QueryResult, WriteMode, WriteOutcome},
};

use super::{event::ChangeEvent, event_emitter::EventEmitter, stream::ChangeStream};

// ============================================================================
// Unsubscribe handle type alias
// ============================================================================

/// An owned one-shot closure that removes a subscription when called.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

// ============================================================================
// ReactiveAdapter
// ============================================================================

pub struct ReactiveAdapter<B: StorageBackend> {
    inner: Mutex<Adapter<B>>,
    emitter: Arc<EventEmitter<ChangeEvent>>,
}

impl<B: StorageBackend> ReactiveAdapter<B> {
    pub fn new(adapter: Adapter<B>) -> Self {
        Self {
            inner: Mutex::new(adapter),
            emitter: Arc::new(EventEmitter::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub fn register(&self, def: CollectionDef) -> Result<Arc<CollectionDef>> {
        self.inner.lock().register(Arc::new(def))
    }

    pub fn collection_def(&self, name: &str) -> Option<Arc<CollectionDef>> {
        self.inner.lock().collection_def(name).cloned()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn get(&self, def: &CollectionDef, id: &str) -> Result<Option<Value>> {
        self.inner.lock().get(def, id)
    }

    pub fn query(&self, def: &CollectionDef, query: &Query) -> Result<QueryResult> {
        self.inner.lock().query(def, query)
    }

    pub fn count(&self, def: &CollectionDef, query: Option<&Query>) -> Result<usize> {
        self.inner.lock().count(def, query)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a new document. Emits `ChangeEvent::Insert` on success.
    pub fn insert(&self, def: &CollectionDef, doc: Value) -> Result<Value> {
        let (doc, _) = self.inner.lock().put(def, doc, WriteMode::Insert)?;
        self.emit_event(ChangeEvent::Insert {
            collection: def.name.clone(),
            id: document_id(def, &doc),
            document: doc.clone(),
        });
        Ok(doc)
    }

    /// Insert or replace a document. Emits `Insert` or `Update` accordingly.
    pub fn upsert(&self, def: &CollectionDef, doc: Value) -> Result<Value> {
        let (doc, outcome) = self.inner.lock().put(def, doc, WriteMode::Upsert)?;
        let collection = def.name.clone();
        let id = document_id(def, &doc);
        let document = doc.clone();
        self.emit_event(match outcome {
            WriteOutcome::Inserted => ChangeEvent::Insert {
                collection,
                id,
                document,
            },
            WriteOutcome::Replaced => ChangeEvent::Update {
                collection,
                id,
                document,
            },
        });
        Ok(doc)
    }

    /// Remove a document. Emits `ChangeEvent::Delete` only if something was
    /// actually removed.
    pub fn remove(&self, def: &CollectionDef, id: &str) -> Result<Option<Value>> {
        let removed = self.inner.lock().delete(def, id)?;
        if let Some(document) = &removed {
            self.emit_event(ChangeEvent::Delete {
                collection: def.name.clone(),
                id: id.to_string(),
                document: document.clone(),
            });
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a global change listener. Call the returned closure to remove
    /// it.
    pub fn on_change(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> Unsubscribe {
        let listener_id = self.emitter.on(callback);
        let emitter = Arc::clone(&self.emitter);

        Box::new(move || {
            emitter.off(listener_id);
        })
    }

    /// Subscribe to one collection's change-feed as an async stream.
    pub fn changes(&self, collection: &str) -> ChangeStream {
        ChangeStream::subscribe(&self.emitter, Some(collection))
    }

    /// Number of registered change listeners.
    pub fn listener_count(&self) -> usize {
        self.emitter.size()
    }

    fn emit_event(&self, event: ChangeEvent) {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.emitter.emit(&event);
        }));
        if outcome.is_err() {
            tracing::warn!(
                collection = event.collection(),
                id = event.id(),
                "change listener panicked"
            );
        }
    }
}

fn document_id(def: &CollectionDef, doc: &Value) -> String {
    doc.get(&def.primary_key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
