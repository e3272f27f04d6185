//! Persistent inbox over the shared namespace.
//!
//! The item list is insertion-ordered newest-first: ingestion prepends, user
//! actions flip `seen` (false -> true only) or clear the list. Every mutation
//! goes through the versioned update path of [`SharedStorage`], and every
//! read loads fresh state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::error::CoreError;
use crate::events::CoreEvent;
use crate::models::InboxItem;
use crate::store::SharedStorage;

pub struct InboxStore {
    storage: SharedStorage,
    subscribers: Mutex<Vec<Sender<CoreEvent>>>,
}

impl InboxStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    // ===== Getters =====

    /// Full item list, insertion-ordered newest-first. Loads fresh state on
    /// every call; two calls without an intervening write return equal lists.
    pub fn items(&self) -> Vec<InboxItem> {
        self.storage.load().items
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items().iter().any(|i| i.id == id)
    }

    pub fn unseen_count(&self) -> usize {
        self.items().iter().filter(|i| !i.seen).count()
    }

    // ===== Mutations =====

    /// Overwrite the full collection atomically.
    pub fn set_items(&self, items: Vec<InboxItem>) -> Result<(), CoreError> {
        self.storage.update(|state| state.items = items.clone())?;
        self.notify_changed();
        Ok(())
    }

    /// Insert a freshly ingested item at the head of the list. Returns whether
    /// the item went in: an id already present (possibly written by another
    /// context) leaves the list untouched and reports `false`, so the caller
    /// can re-roll the id instead of assuming the item was persisted.
    pub fn prepend(&self, item: InboxItem) -> Result<bool, CoreError> {
        let mut inserted = false;
        self.storage.update(|state| {
            inserted = !state.items.iter().any(|i| i.id == item.id);
            if inserted {
                state.items.insert(0, item.clone());
            }
        })?;
        if inserted {
            self.notify_changed();
        }
        Ok(inserted)
    }

    pub fn mark_seen(&self, id: &str) -> Result<(), CoreError> {
        self.storage.update(|state| {
            if let Some(item) = state.items.iter_mut().find(|i| i.id == id) {
                item.seen = true;
            }
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn mark_all_seen(&self) -> Result<(), CoreError> {
        self.storage.update(|state| {
            for item in state.items.iter_mut() {
                item.seen = true;
            }
        })?;
        self.notify_changed();
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CoreError> {
        self.storage.update(|state| state.items.clear())?;
        self.notify_changed();
        Ok(())
    }

    // ===== Change notification =====

    /// Register an in-process listener. Receivers get a [`CoreEvent`] after
    /// every successful write through this store and should re-fetch via
    /// [`items`](Self::items) rather than diffing.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().expect("subscriber lock").push(tx);
        rx
    }

    fn notify_changed(&self) {
        let mut subs = self.subscribers.lock().expect("subscriber lock");
        subs.retain(|tx| tx.send(CoreEvent::ItemsChanged).is_ok());
    }
}
