use std::time::Duration;

use moka::future::Cache;

/// Latest full snapshot the server has seen per document.
///
/// Recorded when a document is loaded at bootstrap and on every
/// client-supplied save payload; read back by the debounced flush. Entries
/// idle out, which is safe: the register never holds content that is not
/// already durable or being made durable.
pub struct SnapshotRegister {
    cache: Cache<String, serde_json::Value>,
}

impl SnapshotRegister {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(Duration::from_secs(300))
                .build(),
        }
    }

    pub async fn record(&self, document_id: &str, snapshot: serde_json::Value) {
        self.cache.insert(document_id.to_string(), snapshot).await;
    }

    pub async fn latest(&self, document_id: &str) -> Option<serde_json::Value> {
        self.cache.get(document_id).await
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for SnapshotRegister {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn latest_returns_most_recent_record() {
        let register = SnapshotRegister::new();
        assert!(register.latest("doc1").await.is_none());
        register.record("doc1", json!({ "ops": [1] })).await;
        register.record("doc1", json!({ "ops": [1, 2] })).await;
        assert_eq!(register.latest("doc1").await, Some(json!({ "ops": [1, 2] })));
        assert!(register.latest("doc2").await.is_none());
    }
}
