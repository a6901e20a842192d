pub mod memory;

use async_trait::async_trait;

use crate::models::{AccessLevel, DocumentRecord};

/// Error from the durable-storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable-storage boundary consumed by the sync engine.
///
/// The Postgres implementation lives in `db::dbdocs`; `memory::MemoryStore`
/// backs tests and db-less development runs. Nothing outside this trait
/// issues durable reads or writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the durable snapshot of a document, or `None` if it does not
    /// exist yet.
    async fn fetch_snapshot(&self, document_id: &str) -> Result<Option<DocumentRecord>, StoreError>;

    /// Create an empty document owned by `identity`. Idempotent: an already
    /// existing document is returned as-is.
    async fn create_document(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<DocumentRecord, StoreError>;

    /// Access level `identity` holds for the document.
    async fn fetch_access_level(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<AccessLevel, StoreError>;

    /// Durably write the document content.
    async fn persist(
        &self,
        document_id: &str,
        content: &serde_json::Value,
    ) -> Result<(), StoreError>;
}
