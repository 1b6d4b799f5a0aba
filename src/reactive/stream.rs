//! `ChangeStream`: async stream view over the change emitter.
//!
//! A listener registered on the emitter forwards matching events into an
//! unbounded channel; the stream side yields them in emission order. Dropping
//! the stream removes the listener.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{adapter::Unsubscribe, event::ChangeEvent, event_emitter::EventEmitter};

/// Infinite stream of change events for one collection.
///
/// The stream only ends if every sender is gone, which cannot happen while
/// the listener is registered.
pub struct ChangeStream {
    events: UnboundedReceiverStream<ChangeEvent>,
    unsubscribe: Option<Unsubscribe>,
}

impl ChangeStream {
    /// Register on `emitter` now and buffer every event for `collection`
    /// (or every event, for `None`) until the stream is polled.
    pub fn subscribe(emitter: &Arc<EventEmitter<ChangeEvent>>, collection: Option<&str>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let collection = collection.map(str::to_string);
        let listener_id = emitter.on(move |event: &ChangeEvent| {
            if collection.as_deref().map_or(true, |c| c == event.collection()) {
                // The receiver is gone only while this stream is being dropped.
                let _ = tx.send(event.clone());
            }
        });
        let emitter = Arc::clone(emitter);

        Self {
            events: UnboundedReceiverStream::new(rx),
            unsubscribe: Some(Box::new(move || {
                emitter.off(listener_id);
            })),
        }
    }
}

impl Stream for ChangeStream {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeStream")
            .field("subscribed", &self.unsubscribe.is_some())
            .finish()
    }
}
