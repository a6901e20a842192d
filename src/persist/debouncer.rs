use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::models::{DocumentSavedMessage, SaveFailedMessage, ServerMessage};
use crate::rooms::RoomRegistry;
use crate::storage::DocumentStore;

struct PendingSave {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Trailing-debounce scheduler for durable document writes.
///
/// Each edit re-arms a per-document timer; a burst of edits collapses into
/// one write a fixed delay after the burst's last edit. At most one timer
/// exists per document at any instant. Disconnects never cancel a timer:
/// the pending save belongs to the document, not to any one session.
pub struct SaveDebouncer {
    delay: Duration,
    store: Arc<dyn DocumentStore>,
    rooms: Arc<RoomRegistry>,
    pending: Arc<Mutex<HashMap<String, PendingSave>>>,
    generation: AtomicU64,
}

impl SaveDebouncer {
    pub fn new(delay: Duration, store: Arc<dyn DocumentStore>, rooms: Arc<RoomRegistry>) -> Self {
        Self {
            delay,
            store,
            rooms,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// (Re)arm the save timer for a document.
    ///
    /// `provider` is resolved only when the timer fires and yields the
    /// snapshot to write; `None` means nothing newer than the durable copy
    /// is known, and the window passes without a write. An armed timer for
    /// the same document is cancelled and replaced.
    pub async fn schedule<F>(&self, document_id: &str, provider: F)
    where
        F: Future<Output = Option<serde_json::Value>> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let document = document_id.to_string();

        let handle = tokio::spawn({
            let delay = self.delay;
            let pending = Arc::clone(&self.pending);
            let store = Arc::clone(&self.store);
            let rooms = Arc::clone(&self.rooms);
            let document = document.clone();
            async move {
                tokio::time::sleep(delay).await;
                // Claim the pending slot before the first await point past
                // the sleep: once removed from the map, this save can no
                // longer be aborted by a re-arm, so it either completes or
                // was never started.
                {
                    let mut pending = pending.lock().await;
                    match pending.get(&document) {
                        Some(entry) if entry.generation == generation => {
                            pending.remove(&document);
                        }
                        _ => return,
                    }
                }
                flush(store, rooms, &document, provider).await;
            }
        });

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.insert(document, PendingSave { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Number of armed timers, for diagnostics.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

async fn flush<F>(
    store: Arc<dyn DocumentStore>,
    rooms: Arc<RoomRegistry>,
    document_id: &str,
    provider: F,
) where
    F: Future<Output = Option<serde_json::Value>> + Send,
{
    let Some(snapshot) = provider.await else {
        debug!(
            "debounced save for '{}' skipped, no snapshot on record",
            document_id
        );
        return;
    };
    match store.persist(document_id, &snapshot).await {
        Ok(()) => {
            info!("debounced save for '{}' persisted", document_id);
            let notice = ServerMessage::DocumentSaved(DocumentSavedMessage {
                status: "All changes saved!".to_string(),
                saved_at: Utc::now().to_rfc3339(),
            });
            rooms
                .broadcast(document_id, serde_json::to_string(&notice).unwrap())
                .await;
        }
        Err(e) => {
            // No retry here: the window has elapsed and the document stays
            // dirty until the next edit re-arms a save.
            error!("debounced save for '{}' failed: {}", document_id, e);
            let notice = ServerMessage::SaveFailed(SaveFailedMessage {
                document_id: document_id.to_string(),
                reason: e.to_string(),
            });
            rooms
                .broadcast(document_id, serde_json::to_string(&notice).unwrap())
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use serde_json::json;

    fn debouncer(delay_ms: u64) -> (Arc<SaveDebouncer>, Arc<MemoryStore>, Arc<RoomRegistry>) {
        let store = Arc::new(MemoryStore::new());
        let rooms = Arc::new(RoomRegistry::new(16));
        let saver = Arc::new(SaveDebouncer::new(
            Duration::from_millis(delay_ms),
            store.clone() as Arc<dyn DocumentStore>,
            rooms.clone(),
        ));
        (saver, store, rooms)
    }

    #[tokio::test]
    async fn burst_collapses_into_one_save_with_last_snapshot() {
        let (saver, store, _rooms) = debouncer(50);
        for i in 0..5 {
            let snapshot = json!({ "ops": [{ "insert": format!("rev-{}", i) }] });
            saver
                .schedule("doc1", async move { Some(snapshot) })
                .await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.persist_count(), 1);
        assert_eq!(
            store.content("doc1").await,
            Some(json!({ "ops": [{ "insert": "rev-4" }] }))
        );
        assert_eq!(saver.pending_count().await, 0);
    }

    #[tokio::test]
    async fn documents_debounce_independently() {
        let (saver, store, _rooms) = debouncer(50);
        saver
            .schedule("doc1", async { Some(json!({ "ops": ["a"] })) })
            .await;
        saver
            .schedule("doc2", async { Some(json!({ "ops": ["b"] })) })
            .await;
        assert_eq!(saver.pending_count().await, 2);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.persist_count(), 2);
        assert_eq!(store.content("doc1").await, Some(json!({ "ops": ["a"] })));
        assert_eq!(store.content("doc2").await, Some(json!({ "ops": ["b"] })));
    }

    #[tokio::test]
    async fn empty_provider_skips_the_window() {
        let (saver, store, _rooms) = debouncer(30);
        saver.schedule("doc1", async { None }).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.persist_count(), 0);
        assert_eq!(saver.pending_count().await, 0);
    }

    #[tokio::test]
    async fn save_is_delayed_until_the_window_elapses() {
        let (saver, store, _rooms) = debouncer(80);
        saver
            .schedule("doc1", async { Some(json!({ "ops": [] })) })
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Still inside the window: nothing written yet.
        assert_eq!(store.persist_count(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.persist_count(), 1);
    }

    #[tokio::test]
    async fn failed_save_is_not_retried_and_is_announced() {
        let (saver, store, rooms) = debouncer(30);
        let mut member = rooms.join("doc1", "alice").await;
        member.receiver.recv().await.unwrap(); // own presence announcement
        store.set_fail_persists(true);

        saver
            .schedule("doc1", async { Some(json!({ "ops": [] })) })
            .await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.persist_count(), 0);
        assert_eq!(saver.pending_count().await, 0);
        let notice = member.receiver.recv().await.unwrap();
        match serde_json::from_str(&notice.payload).unwrap() {
            ServerMessage::SaveFailed(m) => assert_eq!(m.document_id, "doc1"),
            other => panic!("expected save-failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn successful_save_is_announced_to_the_room() {
        let (saver, _store, rooms) = debouncer(30);
        let mut member = rooms.join("doc1", "alice").await;
        member.receiver.recv().await.unwrap();

        saver
            .schedule("doc1", async { Some(json!({ "ops": [] })) })
            .await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let notice = member.receiver.recv().await.unwrap();
        match serde_json::from_str(&notice.payload).unwrap() {
            ServerMessage::DocumentSaved(m) => assert_eq!(m.status, "All changes saved!"),
            other => panic!("expected document-saved, got {:?}", other),
        }
    }
}
