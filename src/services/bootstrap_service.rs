use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::info;

use crate::models::{AccessLevel, DocumentRecord};
use crate::storage::{DocumentStore, StoreError};

/// Opens documents for newly arriving connections.
///
/// Fetches the durable snapshot and the caller's access level and hands
/// both back as one unit, so the client can decide in a single step whether
/// its editor is mutable. A document that does not exist yet is created
/// empty with the opener as its creator. Access lookups are memoized for a
/// short while; the grant a client sees is at most that much out of date.
pub struct BootstrapService {
    store: Arc<dyn DocumentStore>,
    access_cache: Cache<(String, String), AccessLevel>,
}

impl BootstrapService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            access_cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(Duration::from_secs(300))
                .build(),
        }
    }

    /// Fetch snapshot and access level for `identity`. Does not join any
    /// room; membership is a separate step.
    pub async fn open(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<(DocumentRecord, AccessLevel), StoreError> {
        let record = match self.store.fetch_snapshot(document_id).await? {
            Some(record) => record,
            None => {
                info!(
                    "document '{}' not found, creating it for '{}'",
                    document_id, identity
                );
                let record = self.store.create_document(document_id, identity).await?;
                self.access_cache
                    .insert(
                        (document_id.to_string(), identity.to_string()),
                        AccessLevel::Creator,
                    )
                    .await;
                record
            }
        };
        let access = self.access_level(document_id, identity).await?;
        Ok((record, access))
    }

    /// Access level for `identity`, served from the memo cache when warm.
    pub async fn access_level(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<AccessLevel, StoreError> {
        let key = (document_id.to_string(), identity.to_string());
        if let Some(access) = self.access_cache.get(&key).await {
            return Ok(access);
        }
        let access = self.store.fetch_access_level(document_id, identity).await?;
        self.access_cache.insert(key, access).await;
        Ok(access)
    }
}
