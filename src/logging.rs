//! Logging initialization.
//!
//! Library code only emits `tracing` events; binaries and tests call
//! [`init`] once to install a formatter.

use std::sync::Once;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "wallet_db=info";

static INIT_ONCE: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG` (default
/// [`DEFAULT_FILTER`]). Repeated calls are no-ops, and an already-installed
/// global subscriber is left in place.
pub fn init() {
    INIT_ONCE.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .finish()
            .try_init();
    });
}
