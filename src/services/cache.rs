use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// In-memory cache for user records
///
/// Holds each user's decided sets between deck reloads. Entries expire after
/// the configured TTL and are invalidated whenever a decision is written.
///
/// Each key carries an invalidation count. A fill taken before an
/// invalidation is refused, so a slow read cannot put stale data back.
pub struct CacheManager {
    entries: moka::future::Cache<String, Vec<u8>>,
    versions: Mutex<HashMap<String, u64>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            entries,
            versions: Mutex::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Get a value from cache
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.entries.get(key).await {
            tracing::trace!("Cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Invalidation count of `key`, taken before reading the source of truth
    pub async fn version(&self, key: &str) -> u64 {
        self.versions.lock().await.get(key).copied().unwrap_or(0)
    }

    /// Set a value in cache unless `key` was invalidated after `version` was taken.
    ///
    /// Returns whether the value was stored.
    pub async fn set_if_current<T>(&self, key: &str, value: &T, version: u64) -> Result<bool, CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;

        let versions = self.versions.lock().await;
        if versions.get(key).copied().unwrap_or(0) != version {
            tracing::trace!("Cache fill for {} dropped: invalidated meanwhile", key);
            return Ok(false);
        }
        self.entries.insert(key.to_string(), bytes).await;

        tracing::trace!("Cache set: {}", key);
        Ok(true)
    }

    /// Delete a value from the cache and refuse fills started before now
    pub async fn delete(&self, key: &str) {
        let mut versions = self.versions.lock().await;
        *versions.entry(key.to_string()).or_insert(0) += 1;
        self.entries.invalidate(key).await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user's record
    pub fn user_record(user_id: &str) -> String {
        format!("user:{}", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, UserRecord};

    #[tokio::test]
    async fn test_cache_set_get_delete() {
        let cache = CacheManager::new(100, 60);
        let key = CacheKey::user_record("u1");

        let mut record = UserRecord::new("u1", None);
        record.union("mit", Decision::Liked);

        let version = cache.version(&key).await;
        assert!(cache.set_if_current(&key, &record, version).await.unwrap());
        let cached: UserRecord = cache.get(&key).await.unwrap();
        assert_eq!(cached, record);

        cache.delete(&key).await;
        assert!(matches!(
            cache.get::<UserRecord>(&key).await,
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[tokio::test]
    async fn test_fill_after_invalidation_is_dropped() {
        let cache = CacheManager::new(100, 60);
        let key = CacheKey::user_record("u1");

        // Read starts, then a write invalidates the key before the fill lands
        let version = cache.version(&key).await;
        cache.delete(&key).await;

        let stale = UserRecord::new("u1", None);
        assert!(!cache.set_if_current(&key, &stale, version).await.unwrap());
        assert!(cache.get::<UserRecord>(&key).await.is_err());

        let fresh = cache.version(&key).await;
        assert!(cache.set_if_current(&key, &stale, fresh).await.unwrap());
        assert!(cache.get::<UserRecord>(&key).await.is_ok());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::user_record("user123"), "user:user123");
    }
}
