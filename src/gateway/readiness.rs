//! One-shot readiness signal.
//!
//! Starts pending and is resolved exactly once, to either the open wallets
//! collection or the initialization error. Every waiter, early or late, sees
//! the same outcome.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    database::Collection,
    error::{GatewayError, Result, WalletDbError},
};

#[derive(Clone)]
enum ReadyState {
    Pending,
    Ready(Collection),
    Failed(Arc<WalletDbError>),
}

/// Resolving half. Consumed by [`ReadinessResolver::resolve`]; dropping it
/// unresolved makes every waiter fail with `GatewayError::Abandoned`.
pub(crate) struct ReadinessResolver {
    tx: watch::Sender<ReadyState>,
}

/// Waiting half. Cheap to clone.
#[derive(Clone)]
pub(crate) struct Readiness {
    rx: watch::Receiver<ReadyState>,
}

pub(crate) fn readiness() -> (ReadinessResolver, Readiness) {
    let (tx, rx) = watch::channel(ReadyState::Pending);
    (ReadinessResolver { tx }, Readiness { rx })
}

impl ReadinessResolver {
    pub(crate) fn resolve(self, outcome: Result<Collection>) {
        let state = match outcome {
            Ok(wallets) => ReadyState::Ready(wallets),
            Err(e) => ReadyState::Failed(Arc::new(e)),
        };
        self.tx.send_replace(state);
    }
}

impl Readiness {
    /// Wait until the signal resolves.
    pub(crate) async fn wait(&self) -> Result<Collection> {
        let mut rx = self.rx.clone();
        let state = match rx.wait_for(|s| !matches!(s, ReadyState::Pending)).await {
            Ok(state) => (*state).clone(),
            Err(_) => return Err(GatewayError::Abandoned.into()),
        };
        match state {
            ReadyState::Ready(wallets) => Ok(wallets),
            ReadyState::Failed(e) => Err(GatewayError::Initialization(e).into()),
            ReadyState::Pending => Err(GatewayError::Abandoned.into()),
        }
    }

    /// True once the signal resolved successfully.
    pub(crate) fn is_ready(&self) -> bool {
        matches!(*self.rx.borrow(), ReadyState::Ready(_))
    }
}
