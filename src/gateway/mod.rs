//! Reactive wallet gateway.
//!
//! [`WalletGateway`] owns the wallet database for the lifetime of the
//! process. Construction spawns initialization on the tokio runtime and
//! returns at once; every operation returns a stream that first waits for
//! initialization to finish, so callers may subscribe before the database is
//! ready.
//!
//! Storage work runs on the blocking pool. If initialization fails the
//! gateway stays unready for good and every operation yields
//! `GatewayError::Initialization`.

pub mod id;
mod readiness;
pub mod repository;
pub mod wallet;

use std::sync::Arc;

use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt,
};

use crate::{
    config::GatewayConfig,
    database::{Collection, Database},
    error::{GatewayError, Result},
    reactive::{event::ChangeEvent, event_emitter::EventEmitter, stream::ChangeStream},
};

use readiness::{readiness, Readiness};
pub use wallet::{wallet_collection, Wallet, WALLETS_COLLECTION};

// ============================================================================
// WalletGateway
// ============================================================================

struct GatewayInner {
    readiness: Readiness,
    /// Wallet change events, forwarded from the collection once it is open.
    feed: Arc<EventEmitter<ChangeEvent>>,
}

/// Handle to the wallet gateway. Clones share one instance.
#[derive(Clone)]
pub struct WalletGateway {
    inner: Arc<GatewayInner>,
}

impl WalletGateway {
    /// Start the gateway. Must be called from within a tokio runtime.
    pub fn new(config: GatewayConfig) -> Self {
        let (resolver, readiness) = readiness();
        let feed = Arc::new(EventEmitter::new());

        let forward_to = Arc::clone(&feed);
        tokio::spawn(async move {
            tracing::info!(name = %config.name, "initializing wallet database");
            let outcome = run_blocking(move || {
                let wallets = open_wallets(&config)?;
                // Dropping the handle leaves the forwarder registered for the
                // life of the database.
                let _forwarder = wallets.on_change(move |event| forward_to.emit(event));
                Ok(wallets)
            })
            .await;

            match &outcome {
                Ok(wallets) => tracing::info!(collection = wallets.name(), "wallet database ready"),
                Err(e) => tracing::error!(error = %e, "wallet database initialization failed"),
            }
            resolver.resolve(outcome);
        });

        Self {
            inner: Arc::new(GatewayInner { readiness, feed }),
        }
    }

    /// Wait for initialization to finish.
    pub async fn ready(&self) -> Result<()> {
        self.inner.readiness.wait().await.map(|_| ())
    }

    /// True once initialization succeeded.
    pub fn is_ready(&self) -> bool {
        self.inner.readiness.is_ready()
    }

    /// All wallets sorted ascending by name; one item, then the stream ends.
    pub fn list(&self) -> BoxStream<'static, Result<Vec<Wallet>>> {
        self.once(|wallets| repository::find_all_sorted_by_name(&wallets))
    }

    /// Every insert, update, and delete on the wallets collection from the
    /// moment of this call. Never ends on its own; drop it to unsubscribe.
    pub fn changes(&self) -> BoxStream<'static, Result<ChangeEvent>> {
        let events = ChangeStream::subscribe(&self.inner.feed, None);
        let readiness = self.inner.readiness.clone();

        stream::once(async move {
            let items: BoxStream<'static, Result<ChangeEvent>> = match readiness.wait().await {
                Ok(_) => events.map(Ok).boxed(),
                Err(e) => stream::once(future::ready(Err(e))).boxed(),
            };
            items
        })
        .flatten()
        .boxed()
    }

    /// Number of wallets; one item, then the stream ends.
    pub fn count(&self) -> BoxStream<'static, Result<usize>> {
        self.once(|wallets| repository::count_all_documents(&wallets))
    }

    /// The wallet with primary key `id`, or `None`.
    pub fn get_by_id(&self, id: impl Into<String>) -> BoxStream<'static, Result<Option<Wallet>>> {
        let id = id.into();
        self.once(move |wallets| repository::find_one_by_id(&wallets, &id))
    }

    /// Create the next numbered wallet with a fresh random id.
    ///
    /// Reads the count and inserts without holding any lock in between, so
    /// concurrent calls may produce wallets with the same name.
    pub fn create(&self) -> BoxStream<'static, Result<Wallet>> {
        self.once(|wallets| {
            let n = repository::count_all_documents(&wallets)? + 1;
            let wallet = Wallet::numbered(id::random_id(), n);
            let created = repository::insert_wallet(&wallets, &wallet)?;
            tracing::debug!(id = %created.id, name = %created.name, "wallet created");
            Ok(created)
        })
    }

    /// Insert an explicit wallet record.
    pub fn insert(&self, wallet: Wallet) -> BoxStream<'static, Result<Wallet>> {
        self.once(move |wallets| repository::insert_wallet(&wallets, &wallet))
    }

    /// One-item stream: wait for readiness, then run `f` on the blocking pool.
    fn once<T, F>(&self, f: F) -> BoxStream<'static, Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(Collection) -> Result<T> + Send + 'static,
    {
        let readiness = self.inner.readiness.clone();
        stream::once(async move {
            let wallets = readiness.wait().await?;
            run_blocking(move || f(wallets)).await
        })
        .boxed()
    }
}

impl std::fmt::Debug for WalletGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletGateway")
            .field("ready", &self.is_ready())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn open_wallets(config: &GatewayConfig) -> Result<Collection> {
    let db = Database::open(config)?;
    db.add_collection(wallet_collection())
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(GatewayError::TaskJoin(e.to_string()).into()),
    }
}
