//! # Backup Orchestrator
//!
//! Turns document lifecycle events into backup writes and discards.
//!
//! ```text
//! NoBackup --(dirty change, hot exit on)--> BackedUp
//! BackedUp --(dirty change, hot exit on)--> BackedUp    (snapshot overwritten)
//! BackedUp --(save | revert | dispose)----> NoBackup    (discard)
//! BackedUp --(clean change, hot exit on)--> NoBackup    (discard)
//! *        --(change, hot exit off)-------> unchanged   (ignored)
//! ```
//!
//! The state above is never stored. The orchestrator keeps no record of what
//! is backed up: every change is a full overwrite and every discard is an
//! idempotent delete, so there is nothing to fall out of sync with the disk.
//!
//! - The hot exit flag is read on each content change, never cached.
//! - Save, revert and dispose always discard, even with hot exit off, so a
//!   backup made while it was on cannot outlive a clean save.
//! - A change that leaves a document clean discards instead of writing,
//!   for files as well as untitled documents. An untitled document edited
//!   back to empty is clean, and so is a file edited back to its saved text.
//!
//! Each event's store operation is submitted as soon as the event is
//! handled, which fixes its order relative to later events on the same
//! document. Failures are logged and dropped; the next event re-issues the
//! operation anyway.
//!
//! ## Stopping
//!
//! Events are handled on listener tasks, so some may still be queued when
//! the window goes away. [`BackupOrchestrator::shutdown`] stops taking new
//! events, handles the queued ones and waits for their store operations.
//! A save that happened just before exit therefore still discards its
//! backup. [`BackupOrchestrator::dispose`] (and dropping the orchestrator)
//! aborts instead, leaving queued events unhandled.

use crate::config::HotExitSetting;
use crate::error::Result;
use crate::events::{DocumentEvents, DocumentSnapshot, Subscription, TextFileEvent, UntitledEvent};
use crate::model::{BackupAction, Resource};
use crate::store::{BackupFuture, BackupStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct BackupOrchestrator {
    store: Arc<dyn BackupStore>,
    settings: Arc<dyn HotExitSetting>,
    listeners: Vec<JoinHandle<()>>,
    stopping: watch::Sender<bool>,
}

impl BackupOrchestrator {
    /// An orchestrator with no subscriptions; feed it events by hand.
    pub fn new(store: Arc<dyn BackupStore>, settings: Arc<dyn HotExitSetting>) -> Self {
        Self {
            store,
            settings,
            listeners: Vec::new(),
            stopping: watch::Sender::new(false),
        }
    }

    /// Subscribe to both document sources and start reacting to their events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        store: Arc<dyn BackupStore>,
        settings: Arc<dyn HotExitSetting>,
        text_files: &dyn DocumentEvents<TextFileEvent>,
        untitled: &dyn DocumentEvents<UntitledEvent>,
    ) -> Self {
        let mut orchestrator = Self::new(store, settings);
        orchestrator.listen(text_files.subscribe(), handle_text_file_event);
        orchestrator.listen(untitled.subscribe(), handle_untitled_event);
        orchestrator
    }

    pub fn store(&self) -> &Arc<dyn BackupStore> {
        &self.store
    }

    /// Whether any subscription is still being served.
    pub fn is_listening(&self) -> bool {
        self.listeners.iter().any(|task| !task.is_finished())
    }

    pub async fn on_text_file_event(&self, event: TextFileEvent) -> Result<BackupAction> {
        handle_text_file_event(self.store.as_ref(), self.settings.as_ref(), event).await
    }

    pub async fn on_untitled_event(&self, event: UntitledEvent) -> Result<BackupAction> {
        handle_untitled_event(self.store.as_ref(), self.settings.as_ref(), event).await
    }

    /// Stop listening, after handling every event already delivered and
    /// waiting for the store operations they issued.
    ///
    /// Events emitted after this is called are not handled.
    pub async fn shutdown(&mut self) {
        self.stopping.send_replace(true);
        for task in self.listeners.drain(..) {
            if let Err(e) = task.await {
                warn!(err = %e, "document listener ended abnormally");
            }
        }
    }

    /// Drop every subscription at once. Queued events are not handled and
    /// no callback runs after this returns.
    pub fn dispose(&mut self) {
        for task in self.listeners.drain(..) {
            task.abort();
        }
    }

    fn listen<E, F>(&mut self, mut events: Subscription<E>, handle: F)
    where
        E: Send + 'static,
        F: Fn(&dyn BackupStore, &dyn HotExitSetting, E) -> BackupFuture<BackupAction>
            + Send
            + Sync
            + 'static,
    {
        let store = Arc::clone(&self.store);
        let settings = Arc::clone(&self.settings);
        let mut stopping = self.stopping.subscribe();
        self.listeners.push(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    event = events.recv() => event,
                    _ = stopping.changed() => break,
                };
                let Some(event) = event else {
                    debug!("document event source closed");
                    return;
                };
                apply(&handle, store.as_ref(), settings.as_ref(), event).await;
            }
            while let Some(event) = events.try_recv() {
                apply(&handle, store.as_ref(), settings.as_ref(), event).await;
            }
            debug!("stopped listening for document events");
        }));
    }
}

impl Drop for BackupOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn apply<E, F>(handle: &F, store: &dyn BackupStore, settings: &dyn HotExitSetting, event: E)
where
    F: Fn(&dyn BackupStore, &dyn HotExitSetting, E) -> BackupFuture<BackupAction>,
{
    if let Err(e) = handle(store, settings, event).await {
        warn!(err = %e, "backup operation failed");
    }
}

fn handle_text_file_event(
    store: &dyn BackupStore,
    settings: &dyn HotExitSetting,
    event: TextFileEvent,
) -> BackupFuture<BackupAction> {
    match event {
        TextFileEvent::ContentChanged(snapshot) => content_changed(store, settings, snapshot),
        TextFileEvent::Saved(resource)
        | TextFileEvent::Reverted(resource)
        | TextFileEvent::Disposed(resource) => discard(store, &resource),
    }
}

fn handle_untitled_event(
    store: &dyn BackupStore,
    settings: &dyn HotExitSetting,
    event: UntitledEvent,
) -> BackupFuture<BackupAction> {
    match event {
        UntitledEvent::ContentChanged(snapshot) => content_changed(store, settings, snapshot),
        UntitledEvent::Disposed(resource) => discard(store, &resource),
    }
}

fn content_changed(
    store: &dyn BackupStore,
    settings: &dyn HotExitSetting,
    snapshot: DocumentSnapshot,
) -> BackupFuture<BackupAction> {
    if !settings.is_hot_exit_enabled() {
        debug!(resource = %snapshot.resource, "hot exit disabled, ignoring change");
        return Box::pin(async { Ok(BackupAction::Skipped) });
    }
    if !snapshot.is_dirty {
        return discard(store, &snapshot.resource);
    }

    let write = store.write_backup(&snapshot.resource, snapshot.content);
    Box::pin(async move {
        write.await?;
        Ok(BackupAction::Written)
    })
}

fn discard(store: &dyn BackupStore, resource: &Resource) -> BackupFuture<BackupAction> {
    let discard = store.discard_backup(resource);
    Box::pin(async move {
        discard.await?;
        Ok(BackupAction::Discarded)
    })
}
