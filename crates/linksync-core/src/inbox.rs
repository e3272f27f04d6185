//! Inbox presentation and user actions.
//!
//! The renderer partitions the persisted list into "unseen" and "all" views.
//! Every action mutates through the store and re-reads the freshly persisted
//! state afterwards - never an in-memory assumption - since another context
//! may have changed other properties in between.

use std::sync::Arc;

use crate::error::CoreError;
use crate::models::{InboxItem, ItemKind};
use crate::notify::{ClipboardSink, UrlOpener};
use crate::store::InboxStore;

/// Snapshot of the two inbox tabs, both newest-first.
#[derive(Debug, Clone, Default)]
pub struct InboxView {
    pub unseen: Vec<InboxItem>,
    pub all: Vec<InboxItem>,
}

impl InboxView {
    pub fn from_items(items: Vec<InboxItem>) -> Self {
        let unseen = items.iter().filter(|i| !i.seen).cloned().collect();
        Self { unseen, all: items }
    }
}

/// Result of a user action: the re-fetched list plus an optional transient
/// confirmation for the UI to flash.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub view: InboxView,
    pub confirmation: Option<String>,
}

pub struct ActionHandler {
    store: Arc<InboxStore>,
    opener: Arc<dyn UrlOpener>,
    clipboard: Arc<dyn ClipboardSink>,
}

impl ActionHandler {
    pub fn new(
        store: Arc<InboxStore>,
        opener: Arc<dyn UrlOpener>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        Self {
            store,
            opener,
            clipboard,
        }
    }

    pub fn view(&self) -> InboxView {
        InboxView::from_items(self.store.items())
    }

    /// Open a url item through the host and mark it seen.
    pub fn open(&self, id: &str) -> Result<ActionOutcome, CoreError> {
        let item = self.find(id)?;
        if item.kind != ItemKind::Url {
            return Err(CoreError::Host(format!("Item {} is not a link", id)));
        }
        if let Some(ref url) = item.url {
            self.opener.open_url(url)?;
        }
        self.store.mark_seen(id)?;
        Ok(self.outcome(None))
    }

    /// Copy a text item's body to the clipboard and mark it seen.
    pub fn copy(&self, id: &str) -> Result<ActionOutcome, CoreError> {
        let item = self.find(id)?;
        if item.kind != ItemKind::Text {
            return Err(CoreError::Host(format!("Item {} is not text", id)));
        }
        self.clipboard.copy_text(&item.body)?;
        self.store.mark_seen(id)?;
        Ok(self.outcome(Some("Copied to clipboard".to_string())))
    }

    pub fn mark_all_read(&self) -> Result<ActionOutcome, CoreError> {
        self.store.mark_all_seen()?;
        Ok(self.outcome(None))
    }

    pub fn clear_all(&self) -> Result<ActionOutcome, CoreError> {
        self.store.clear()?;
        Ok(self.outcome(None))
    }

    fn find(&self, id: &str) -> Result<InboxItem, CoreError> {
        self.store
            .items()
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::Host(format!("No such item: {}", id)))
    }

    fn outcome(&self, confirmation: Option<String>) -> ActionOutcome {
        ActionOutcome {
            view: self.view(),
            confirmation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SharedStorage;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl UrlOpener for RecordingOpener {
        fn open_url(&self, url: &str) -> Result<(), CoreError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Mutex<Vec<String>>,
    }

    impl ClipboardSink for RecordingClipboard {
        fn copy_text(&self, text: &str) -> Result<(), CoreError> {
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Fixture {
        handler: ActionHandler,
        store: Arc<InboxStore>,
        opener: Arc<RecordingOpener>,
        clipboard: Arc<RecordingClipboard>,
    }

    fn fixture(dir: &std::path::Path) -> Fixture {
        let store = Arc::new(InboxStore::new(SharedStorage::new(dir)));
        let opener = Arc::new(RecordingOpener::default());
        let clipboard = Arc::new(RecordingClipboard::default());
        let handler = ActionHandler::new(store.clone(), opener.clone(), clipboard.clone());
        Fixture {
            handler,
            store,
            opener,
            clipboard,
        }
    }

    fn url_item(id: &str, at: u64) -> InboxItem {
        InboxItem::new_url(
            id.to_string(),
            Some("t".to_string()),
            String::new(),
            format!("https://example.com/{id}"),
            at,
        )
    }

    fn text_item(id: &str, at: u64) -> InboxItem {
        InboxItem::new_text(id.to_string(), None, format!("body {id}"), at)
    }

    #[test]
    fn test_partition_unseen_vs_all() {
        let dir = tempdir().unwrap();
        let f = fixture(dir.path());
        f.store.prepend(text_item("a", 1)).unwrap();
        f.store.prepend(text_item("b", 2)).unwrap();
        f.store.mark_seen("a").unwrap();

        let view = f.handler.view();
        assert_eq!(view.all.len(), 2);
        assert_eq!(view.unseen.len(), 1);
        assert_eq!(view.unseen[0].id, "b");
    }

    #[test]
    fn test_open_marks_seen_and_refetches() {
        let dir = tempdir().unwrap();
        let f = fixture(dir.path());
        f.store.prepend(url_item("a", 1)).unwrap();

        let outcome = f.handler.open("a").unwrap();
        assert_eq!(
            f.opener.opened.lock().unwrap().as_slice(),
            ["https://example.com/a"]
        );
        assert!(outcome.view.all[0].seen);
        assert!(outcome.view.unseen.is_empty());
    }

    #[test]
    fn test_open_rejects_text_items() {
        let dir = tempdir().unwrap();
        let f = fixture(dir.path());
        f.store.prepend(text_item("a", 1)).unwrap();

        assert!(f.handler.open("a").is_err());
        assert!(f.opener.opened.lock().unwrap().is_empty());
        assert!(!f.store.items()[0].seen);
    }

    #[test]
    fn test_copy_text_confirms_and_marks_seen() {
        let dir = tempdir().unwrap();
        let f = fixture(dir.path());
        f.store.prepend(text_item("a", 1)).unwrap();

        let outcome = f.handler.copy("a").unwrap();
        assert_eq!(f.clipboard.copied.lock().unwrap().as_slice(), ["body a"]);
        assert_eq!(outcome.confirmation.as_deref(), Some("Copied to clipboard"));
        assert!(outcome.view.all[0].seen);
    }

    #[test]
    fn test_mark_all_read_covers_partial_seen_list() {
        let dir = tempdir().unwrap();
        let f = fixture(dir.path());
        f.store.prepend(text_item("a", 1)).unwrap();
        f.store.prepend(text_item("b", 2)).unwrap();
        f.store.prepend(text_item("c", 3)).unwrap();
        f.store.mark_seen("b").unwrap();

        let outcome = f.handler.mark_all_read().unwrap();
        assert_eq!(outcome.view.all.len(), 3);
        assert!(outcome.view.all.iter().all(|i| i.seen));
        assert!(outcome.view.unseen.is_empty());
    }

    #[test]
    fn test_clear_all_empties_list() {
        let dir = tempdir().unwrap();
        let f = fixture(dir.path());
        f.store.prepend(text_item("a", 1)).unwrap();
        f.store.mark_seen("a").unwrap();
        f.store.prepend(text_item("b", 2)).unwrap();

        let outcome = f.handler.clear_all().unwrap();
        assert!(outcome.view.all.is_empty());
        assert!(f.store.items().is_empty());
    }
}
