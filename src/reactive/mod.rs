//! Reactive layer: change events over `Adapter<B>`.
//!
//! # Modules
//!
//! - [`event`]: [`ChangeEvent`] enum.
//! - [`event_emitter`]: Generic typed pub/sub ([`EventEmitter<T>`]).
//! - [`adapter`]: [`ReactiveAdapter<B>`], which emits after every write.
//! - [`stream`]: [`ChangeStream`], an async stream of one collection's events.

pub mod adapter;
pub mod event;
pub mod event_emitter;
pub mod stream;

pub use adapter::{ReactiveAdapter, Unsubscribe};
pub use event::{ChangeEvent, ChangeOperation};
pub use event_emitter::{EventEmitter, ListenerId};
pub use stream::ChangeStream;
