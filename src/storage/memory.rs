use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{AccessLevel, DocumentRecord};
use crate::storage::{DocumentStore, StoreError};

struct StoredDocument {
    record: DocumentRecord,
    owner: String,
    access: HashMap<String, AccessLevel>,
}

/// In-memory `DocumentStore`.
///
/// Used when no database URL is configured, and by the test suites, which
/// also use the persist counter to observe debounce behaviour.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, StoredDocument>>,
    persist_count: AtomicU64,
    fail_persists: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful persist calls since construction.
    pub fn persist_count(&self) -> u64 {
        self.persist_count.load(Ordering::SeqCst)
    }

    /// Make every subsequent persist call fail (durable-write failure path).
    pub fn set_fail_persists(&self, fail: bool) {
        self.fail_persists.store(fail, Ordering::SeqCst);
    }

    /// Seed a document with explicit access grants.
    pub async fn insert_document(
        &self,
        document_id: &str,
        record: DocumentRecord,
        owner: &str,
        access: &[(&str, AccessLevel)],
    ) {
        let mut docs = self.docs.write().await;
        docs.insert(
            document_id.to_string(),
            StoredDocument {
                record,
                owner: owner.to_string(),
                access: access
                    .iter()
                    .map(|(identity, level)| (identity.to_string(), *level))
                    .collect(),
            },
        );
    }

    /// Current content of a document, if it exists.
    pub async fn content(&self, document_id: &str) -> Option<serde_json::Value> {
        let docs = self.docs.read().await;
        docs.get(document_id).map(|doc| doc.record.content.clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_snapshot(&self, document_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.get(document_id).map(|doc| doc.record.clone()))
    }

    async fn create_document(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<DocumentRecord, StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .entry(document_id.to_string())
            .or_insert_with(|| StoredDocument {
                record: DocumentRecord::empty(),
                owner: identity.to_string(),
                access: HashMap::new(),
            });
        Ok(doc.record.clone())
    }

    async fn fetch_access_level(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<AccessLevel, StoreError> {
        let docs = self.docs.read().await;
        let Some(doc) = docs.get(document_id) else {
            return Ok(AccessLevel::None);
        };
        if doc.owner == identity {
            return Ok(AccessLevel::Creator);
        }
        Ok(doc
            .access
            .get(identity)
            .copied()
            .unwrap_or(AccessLevel::None))
    }

    async fn persist(
        &self,
        document_id: &str,
        content: &serde_json::Value,
    ) -> Result<(), StoreError> {
        if self.fail_persists.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store configured to fail".to_string(),
            ));
        }
        let mut docs = self.docs.write().await;
        match docs.get_mut(document_id) {
            Some(doc) => doc.record.content = content.clone(),
            None => {
                debug!("persist for unknown document '{}', creating it", document_id);
                docs.insert(
                    document_id.to_string(),
                    StoredDocument {
                        record: DocumentRecord {
                            content: content.clone(),
                            ..DocumentRecord::empty()
                        },
                        owner: String::new(),
                        access: HashMap::new(),
                    },
                );
            }
        }
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.create_document("doc1", "alice").await.unwrap();
        store
            .persist("doc1", &json!({ "ops": [{ "insert": "hello" }] }))
            .await
            .unwrap();
        let second = store.create_document("doc1", "bob").await.unwrap();
        assert_eq!(first.title, "Untitled Document");
        // Second create must not reset content or ownership.
        assert_eq!(second.content, json!({ "ops": [{ "insert": "hello" }] }));
        assert_eq!(
            store.fetch_access_level("doc1", "alice").await.unwrap(),
            AccessLevel::Creator
        );
        assert_eq!(
            store.fetch_access_level("doc1", "bob").await.unwrap(),
            AccessLevel::None
        );
    }

    #[tokio::test]
    async fn access_levels_resolve() {
        let store = MemoryStore::new();
        store
            .insert_document(
                "doc1",
                DocumentRecord::empty(),
                "alice",
                &[("bob", AccessLevel::Editor), ("carol", AccessLevel::Viewer)],
            )
            .await;
        assert_eq!(
            store.fetch_access_level("doc1", "alice").await.unwrap(),
            AccessLevel::Creator
        );
        assert_eq!(
            store.fetch_access_level("doc1", "bob").await.unwrap(),
            AccessLevel::Editor
        );
        assert_eq!(
            store.fetch_access_level("doc1", "carol").await.unwrap(),
            AccessLevel::Viewer
        );
        assert_eq!(
            store.fetch_access_level("doc1", "mallory").await.unwrap(),
            AccessLevel::None
        );
        assert_eq!(
            store.fetch_access_level("nope", "alice").await.unwrap(),
            AccessLevel::None
        );
    }

    #[tokio::test]
    async fn persist_failure_is_surfaced() {
        let store = MemoryStore::new();
        store.create_document("doc1", "alice").await.unwrap();
        store.set_fail_persists(true);
        let result = store.persist("doc1", &json!({ "ops": [] })).await;
        assert!(result.is_err());
        assert_eq!(store.persist_count(), 0);
    }
}
