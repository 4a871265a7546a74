//! Fan-out of change events to live observers.

use std::{
    collections::HashMap,
    pin::Pin,
    sync::{
        Arc, PoisonError, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;

use crate::{ChangeEvent, config::DEFAULT_SUBSCRIBER_BUFFER};

/// Subscriber identifier.
pub type SubscriberId = u64;

struct Registry {
    senders: RwLock<HashMap<SubscriberId, mpsc::Sender<ChangeEvent>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, id: SubscriberId) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Publish/subscribe hub for state deltas.
///
/// Publishing never blocks: each subscriber has a bounded queue and an
/// event is dropped for a subscriber whose queue is full. Cloning yields
/// another handle to the same set of subscribers.
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<Registry>,
    buffer: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl Notifier {
    /// Create a notifier whose subscribers each queue up to `buffer` events.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                senders: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
            buffer: buffer.max(1),
        }
    }

    /// Register a new observer.
    ///
    /// The observer stays registered until the returned handle is dropped.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        tracing::debug!(subscriber = id, "subscriber registered");

        Subscription {
            id,
            inner: ReceiverStream::new(rx),
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every observer, best effort.
    pub fn publish(&self, event: &ChangeEvent) {
        let targets: Vec<(SubscriberId, mpsc::Sender<ChangeEvent>)> = self
            .registry
            .senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        if targets.is_empty() {
            tracing::trace!(event = event.kind(), "no subscribers");
            return;
        }

        let mut closed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = id,
                        event = event.kind(),
                        "subscriber lagging, event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in closed {
            tracing::debug!(subscriber = id, "subscriber gone");
            self.registry.remove(id);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle to a registered observer. Yields events as a [`Stream`].
pub struct Subscription {
    id: SubscriberId,
    inner: ReceiverStream<ChangeEvent>,
    registry: Weak<Registry>,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.inner.as_mut().try_recv().ok()
    }

    /// Stream that yields `initial` first, then live events.
    ///
    /// Used by streaming clients that need a snapshot before deltas.
    #[must_use]
    pub fn with_snapshot(
        self,
        initial: Vec<ChangeEvent>,
    ) -> futures::stream::BoxStream<'static, ChangeEvent> {
        futures::stream::iter(initial).chain(self).boxed()
    }

    /// SSE stream of `initial` then live events (requires `sse` feature).
    #[cfg(feature = "sse")]
    #[must_use]
    pub fn sse_stream(
        self,
        initial: Vec<ChangeEvent>,
    ) -> futures::stream::BoxStream<'static, Result<axum::response::sse::Event, axum::Error>> {
        self.with_snapshot(initial)
            .map(|event| event.to_sse_event())
            .boxed()
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            tracing::debug!(subscriber = self.id, "subscriber unregistered");
        }
    }
}
