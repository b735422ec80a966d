use std::sync::Arc;

use crate::core::ports::{DocumentStore, StoreError};
use crate::models::DecisionRecord;
use crate::services::cache::{CacheKey, CacheManager};

/// Write path for likes and dislikes.
///
/// Writes are best effort: they are attempted once, failures are logged,
/// and the deck advances regardless.
#[derive(Clone)]
pub struct DecisionSink {
    store: Arc<dyn DocumentStore>,
    cache: Arc<CacheManager>,
}

impl DecisionSink {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<CacheManager>) -> Self {
        Self { store, cache }
    }

    /// Persist one decision. `Ok(false)` means it was already recorded.
    pub async fn record(&self, record: &DecisionRecord) -> Result<bool, StoreError> {
        let added = self
            .store
            .add_decision(&record.user_id, &record.card_id, record.decision)
            .await?;

        // The cached decided set is now stale
        self.cache
            .delete(&CacheKey::user_record(&record.user_id))
            .await;

        Ok(added)
    }

    /// Persist a decision, logging instead of returning failures
    pub async fn submit(&self, record: DecisionRecord) {
        match self.record(&record).await {
            Ok(true) => tracing::info!(
                "{:?} {} for {}",
                record.decision,
                record.card_id,
                record.user_id
            ),
            Ok(false) => tracing::debug!(
                "{:?} {} for {} was already recorded",
                record.decision,
                record.card_id,
                record.user_id
            ),
            Err(e) => tracing::warn!(
                "Failed to record {:?} {} for {}: {}",
                record.decision,
                record.card_id,
                record.user_id,
                e
            ),
        }
    }

    /// Fire-and-forget variant of [`DecisionSink::submit`]
    pub fn dispatch(&self, record: DecisionRecord) {
        let sink = self.clone();
        tokio::spawn(async move { sink.submit(record).await });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, UserRecord};
    use crate::services::memory::MemoryStore;

    fn record(card_id: &str, decision: Decision) -> DecisionRecord {
        DecisionRecord {
            user_id: "u1".to_string(),
            card_id: card_id.to_string(),
            decision,
            decided_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_decision_recorded_once() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(UserRecord::new("u1", None)).await;
        let sink = DecisionSink::new(store.clone(), Arc::new(CacheManager::new(10, 60)));

        assert!(sink.record(&record("mit", Decision::Liked)).await.unwrap());
        assert!(!sink.record(&record("mit", Decision::Liked)).await.unwrap());

        let user = store.get_user("u1").await.unwrap();
        assert_eq!(user.liked_colleges, vec!["mit"]);
    }

    #[tokio::test]
    async fn test_record_invalidates_cached_user() {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(UserRecord::new("u1", None)).await;
        let cache = Arc::new(CacheManager::new(10, 60));
        let key = CacheKey::user_record("u1");
        let version = cache.version(&key).await;
        cache
            .set_if_current(&key, &UserRecord::new("u1", None), version)
            .await
            .unwrap();

        let sink = DecisionSink::new(store, cache.clone());
        sink.record(&record("yale", Decision::Disliked)).await.unwrap();

        assert!(cache.get::<UserRecord>(&key).await.is_err());
    }

    #[tokio::test]
    async fn test_submit_swallows_failures() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true).await;
        let sink = DecisionSink::new(store, Arc::new(CacheManager::new(10, 60)));

        // Must not panic or propagate
        sink.submit(record("mit", Decision::Liked)).await;
    }
}
