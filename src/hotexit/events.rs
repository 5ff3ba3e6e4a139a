//! Document lifecycle notifications consumed by the orchestrator.
//!
//! Document models are external; all hot exit needs from them is a stream of
//! events. Each source implements [`DocumentEvents`] and hands out
//! [`Subscription`]s. Dropping a subscription unsubscribes it.
//!
//! Delivery is unbounded and lossless: a slow subscriber never misses a
//! save or dispose, which would otherwise leave a stale backup behind.

use crate::model::Resource;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Content of a document at the moment of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub resource: Resource,
    pub content: String,
    pub is_dirty: bool,
}

impl DocumentSnapshot {
    pub fn new(resource: Resource, content: impl Into<String>, is_dirty: bool) -> Self {
        Self {
            resource,
            content: content.into(),
            is_dirty,
        }
    }
}

/// Events from documents backed by a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFileEvent {
    ContentChanged(DocumentSnapshot),
    Saved(Resource),
    Reverted(Resource),
    Disposed(Resource),
}

/// Events from never-saved documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntitledEvent {
    ContentChanged(DocumentSnapshot),
    Disposed(Resource),
}

/// A source of document events.
pub trait DocumentEvents<E>: Send + Sync {
    fn subscribe(&self) -> Subscription<E>;
}

/// Receiving end of a subscription. Drop it to unsubscribe.
pub struct Subscription<E> {
    rx: UnboundedReceiver<E>,
}

impl<E> Subscription<E> {
    /// Next event, or `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Next event if one is already waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}

/// Fan-out emitter: every event goes to every live subscriber, in order.
pub struct EventEmitter<E> {
    subscribers: Mutex<Vec<UnboundedSender<E>>>,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone + Send + 'static> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to all subscribers, forgetting the ones that left.
    pub fn emit(&self, event: E) {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UnboundedSender<E>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<E: Clone + Send + 'static> DocumentEvents<E> for EventEmitter<E> {
    fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        Subscription { rx }
    }
}
