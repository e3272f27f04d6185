//! Push ingestion for the companion surface.
//!
//! An inbound push event carries an opaque JSON payload shaped like
//! `{"data": {"title": ..., "body": ..., "link": ...}}`. Parsing is
//! defensive: a payload that cannot be parsed still produces a placeholder
//! item instead of being dropped. A re-delivered identical push becomes a
//! second item - the delivery service exposes no stable message id to dedupe
//! on, so ids are freshly generated at ingestion time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::error::CoreError;
use crate::models::{classify, InboxItem, ItemKind};
use crate::notify::{Notification, Notifier, UrlOpener};
use crate::store::InboxStore;

const PLACEHOLDER_TITLE: &str = "New Notification";
const PLACEHOLDER_BODY: &str = "You have a new message!";

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    #[serde(default)]
    data: PushData,
}

#[derive(Debug, Default, Deserialize)]
struct PushData {
    title: Option<String>,
    body: Option<String>,
    link: Option<String>,
}

/// Reacts to inbound push events: normalizes the payload into an inbox item,
/// persists it, and surfaces a visible notification.
pub struct IngestListener {
    store: Arc<InboxStore>,
    notifier: Arc<dyn Notifier>,
    /// Tie-breaker so ids stay unique within one ingestion burst even when
    /// two pushes land in the same millisecond.
    sequence: AtomicU64,
}

impl IngestListener {
    pub fn new(store: Arc<InboxStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            sequence: AtomicU64::new(0),
        }
    }

    /// Handle one push delivery. Never drops the event: malformed payloads
    /// fall back to a generic placeholder item. Returns the persisted item.
    pub fn handle_push(&self, raw: &str) -> Result<InboxItem, CoreError> {
        let payload = match serde_json::from_str::<PushPayload>(raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("failed to parse push payload: {}", e);
                PushPayload::default()
            }
        };

        let title = payload
            .data
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
        let body = payload
            .data
            .body
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_BODY.to_string());
        let link = payload
            .data
            .link
            .filter(|l| classify(l) == ItemKind::Url);

        let received_at = epoch_millis();

        let mut item = match link {
            Some(url) => {
                InboxItem::new_url(String::new(), Some(title.clone()), body.clone(), url, received_at)
            }
            None => InboxItem::new_text(String::new(), Some(title.clone()), body.clone(), received_at),
        };

        // Another context may race the same id into the list between the
        // pre-check and the write; re-roll until the insert is acknowledged.
        loop {
            item.id = self.fresh_id(received_at);
            if self.store.prepend(item.clone())? {
                break;
            }
        }

        self.notifier.notify(&Notification {
            item_id: item.id.clone(),
            title,
            body,
            link: item.url.clone(),
        });

        Ok(item)
    }

    /// Route a notification click back to the item: url items open via the
    /// host, text items only dismiss. Either way the item is marked seen.
    pub fn handle_notification_click(
        &self,
        id: &str,
        opener: &dyn UrlOpener,
    ) -> Result<(), CoreError> {
        let clicked = self.store.items().into_iter().find(|i| i.id == id);

        if let Some(item) = clicked {
            if item.kind == ItemKind::Url {
                if let Some(ref url) = item.url {
                    opener.open_url(url)?;
                }
            }
        }

        self.store.mark_seen(id)
    }

    /// Ingestion-time-derived id, re-rolled while it collides with an id
    /// already in the list. Collisions that land between this check and the
    /// write are caught by [`InboxStore::prepend`] reporting the skip.
    fn fresh_id(&self, received_at: u64) -> String {
        loop {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let id = format!("{}-{}", received_at, seq);
            if !self.store.contains(&id) {
                return id;
            }
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SharedStorage;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: &Notification) {
            self.shown.lock().unwrap().push(notification.clone());
        }
    }

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

    fn listener(dir: &std::path::Path) -> (IngestListener, Arc<InboxStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(InboxStore::new(SharedStorage::new(dir)));
        let notifier = Arc::new(RecordingNotifier::default());
        let listener = IngestListener::new(store.clone(), notifier.clone());
        (listener, store, notifier)
    }

    #[test]
    fn test_link_payload_ingests_as_url_item() {
        let dir = tempdir().unwrap();
        let (listener, store, notifier) = listener(dir.path());

        let raw = r#"{"data":{"title":"Hi","body":"hello","link":"https://x.com"}}"#;
        let item = listener.handle_push(raw).unwrap();

        assert_eq!(item.kind, ItemKind::Url);
        assert_eq!(item.url.as_deref(), Some("https://x.com"));
        assert_eq!(item.title.as_deref(), Some("Hi"));
        assert!(!item.seen);

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], item);

        let shown = notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Hi");
        assert_eq!(shown[0].link.as_deref(), Some("https://x.com"));
    }

    #[test]
    fn test_payload_without_link_ingests_as_text() {
        let dir = tempdir().unwrap();
        let (listener, _, _) = listener(dir.path());

        let raw = r#"{"data":{"title":"Note","body":"buy milk"}}"#;
        let item = listener.handle_push(raw).unwrap();
        assert_eq!(item.kind, ItemKind::Text);
        assert!(item.url.is_none());
        assert_eq!(item.body, "buy milk");
    }

    #[test]
    fn test_non_http_link_falls_back_to_text() {
        let dir = tempdir().unwrap();
        let (listener, _, _) = listener(dir.path());

        let raw = r#"{"data":{"title":"T","body":"b","link":"ftp://x"}}"#;
        let item = listener.handle_push(raw).unwrap();
        assert_eq!(item.kind, ItemKind::Text);
        assert!(item.url.is_none());
    }

    #[test]
    fn test_malformed_payload_produces_placeholder() {
        let dir = tempdir().unwrap();
        let (listener, store, notifier) = listener(dir.path());

        let item = listener.handle_push("{not json at all").unwrap();
        assert_eq!(item.kind, ItemKind::Text);
        assert_eq!(item.title.as_deref(), Some(PLACEHOLDER_TITLE));
        assert_eq!(item.body, PLACEHOLDER_BODY);
        assert_eq!(store.items().len(), 1);
        assert_eq!(notifier.shown.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_invariant_newest_first() {
        let dir = tempdir().unwrap();
        let (listener, store, _) = listener(dir.path());
        let before = store.items().len();

        let a = listener
            .handle_push(r#"{"data":{"title":"A","body":"a"}}"#)
            .unwrap();
        let b = listener
            .handle_push(r#"{"data":{"title":"B","body":"b"}}"#)
            .unwrap();

        let items = store.items();
        assert_eq!(items.len(), before + 2);
        assert_eq!(items[0].id, b.id);
        assert_eq!(items[1].id, a.id);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_burst_ids_are_unique() {
        let dir = tempdir().unwrap();
        let (listener, store, _) = listener(dir.path());

        for _ in 0..20 {
            listener
                .handle_push(r#"{"data":{"title":"t","body":"b"}}"#)
                .unwrap();
        }

        let items = store.items();
        let mut ids: Vec<_> = items.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_two_contexts_ingesting_concurrently_lose_nothing() {
        let dir = tempdir().unwrap();
        let raw = r#"{"data":{"title":"t","body":"b"}}"#;

        // Two listener processes over the same shared directory, each with
        // its own sequence counter, so same-millisecond ids collide.
        let mut workers = Vec::new();
        for _ in 0..2 {
            let path = dir.path().to_path_buf();
            workers.push(std::thread::spawn(move || {
                let store = Arc::new(InboxStore::new(SharedStorage::new(&path)));
                let listener =
                    IngestListener::new(store, Arc::new(RecordingNotifier::default()));
                let mut acked = Vec::new();
                for _ in 0..50 {
                    if let Ok(item) = listener.handle_push(raw) {
                        acked.push(item.id);
                    }
                }
                acked
            }));
        }

        let acked: Vec<String> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();

        // Every acknowledged push is in the persisted list, nothing extra.
        let store = InboxStore::new(SharedStorage::new(dir.path()));
        let items = store.items();
        assert_eq!(items.len(), acked.len());
        for id in &acked {
            assert!(items.iter().any(|i| &i.id == id), "missing item {id}");
        }
    }

    #[test]
    fn test_click_on_url_item_opens_and_marks_seen() {
        let dir = tempdir().unwrap();
        let (listener, store, _) = listener(dir.path());
        let opener = RecordingOpener::default();

        let item = listener
            .handle_push(r#"{"data":{"title":"Hi","body":"b","link":"https://x.com"}}"#)
            .unwrap();
        listener.handle_notification_click(&item.id, &opener).unwrap();

        assert_eq!(opener.opened.lock().unwrap().as_slice(), ["https://x.com"]);
        assert!(store.items()[0].seen);
    }

    #[test]
    fn test_click_on_text_item_only_marks_seen() {
        let dir = tempdir().unwrap();
        let (listener, store, _) = listener(dir.path());
        let opener = RecordingOpener::default();

        let item = listener
            .handle_push(r#"{"data":{"title":"Hi","body":"b"}}"#)
            .unwrap();
        listener.handle_notification_click(&item.id, &opener).unwrap();

        assert!(opener.opened.lock().unwrap().is_empty());
        assert!(store.items()[0].seen);
    }
}
