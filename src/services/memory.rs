use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::filters::{decode_college, decode_college_documents};
use crate::core::ports::{DocumentStore, StoreError};
use crate::models::{CollegeCard, Decision, FetchReport, StudentProfile, UserRecord};

/// In-process document store with the same set-union semantics as the remote one.
///
/// Backs `store.backend = "memory"` for local development and the test suite.
/// Colleges are kept as raw documents so malformed entries exercise the same
/// decode path as remote ones.
#[derive(Default)]
pub struct MemoryStore {
    colleges: RwLock<Vec<Value>>,
    users: RwLock<HashMap<String, UserRecord>>,
    offline: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colleges(colleges: Vec<CollegeCard>) -> Self {
        let docs = colleges
            .iter()
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect();
        Self {
            colleges: RwLock::new(docs),
            ..Default::default()
        }
    }

    /// Store preloaded with raw college documents
    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            colleges: RwLock::new(documents),
            ..Default::default()
        }
    }

    /// Add a raw document, valid or not
    pub async fn insert_raw_college(&self, doc: Value) {
        self.colleges.write().await.push(doc);
    }

    pub async fn insert_user(&self, record: UserRecord) {
        self.users
            .write()
            .await
            .insert(record.user_id.clone(), record);
    }

    /// Make every call fail as if the network were down
    pub async fn set_offline(&self, offline: bool) {
        *self.offline.write().await = offline;
    }

    async fn ensure_online(&self) -> Result<(), StoreError> {
        if *self.offline.read().await {
            return Err(StoreError::ApiError("store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_colleges(&self) -> Result<FetchReport, StoreError> {
        self.ensure_online().await?;
        let docs = self.colleges.read().await;
        Ok(decode_college_documents(&docs))
    }

    async fn get_college(&self, college_id: &str) -> Result<CollegeCard, StoreError> {
        self.ensure_online().await?;
        let docs = self.colleges.read().await;
        let doc = docs
            .iter()
            .find(|d| d.get("$id").and_then(|id| id.as_str()) == Some(college_id))
            .ok_or_else(|| StoreError::NotFound(format!("college {}", college_id)))?;

        decode_college(doc).map_err(|skipped| {
            StoreError::InvalidResponse(format!("college {}: {}", skipped.id, skipped.reason))
        })
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, StoreError> {
        self.ensure_online().await?;
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.ensure_online().await?;
        let mut users = self.users.write().await;
        if users.contains_key(&record.user_id) {
            return Err(StoreError::ApiError(format!(
                "user {} already exists",
                record.user_id
            )));
        }
        users.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn add_decision(
        &self,
        user_id: &str,
        college_id: &str,
        decision: Decision,
    ) -> Result<bool, StoreError> {
        self.ensure_online().await?;
        let mut users = self.users.write().await;
        let record = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id, None));
        Ok(record.union(college_id, decision))
    }

    async fn save_profile(&self, user_id: &str, profile: &StudentProfile) -> Result<(), StoreError> {
        self.ensure_online().await?;
        let mut users = self.users.write().await;
        let record = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;
        record.profile = Some(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_decision_is_set_union() {
        let store = MemoryStore::new();
        store.insert_user(UserRecord::new("u1", None)).await;

        assert!(store.add_decision("u1", "mit", Decision::Liked).await.unwrap());
        assert!(!store.add_decision("u1", "mit", Decision::Liked).await.unwrap());

        let record = store.get_user("u1").await.unwrap();
        assert_eq!(record.liked_colleges, vec!["mit"]);
    }

    #[tokio::test]
    async fn test_decision_creates_missing_user() {
        let store = MemoryStore::new();

        assert!(store.add_decision("ghost", "yale", Decision::Disliked).await.unwrap());

        let record = store.get_user("ghost").await.unwrap();
        assert_eq!(record.disliked_colleges, vec!["yale"]);
        assert!(record.liked_colleges.is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true).await;
        assert!(store.list_colleges().await.is_err());
        assert!(store.get_user("u1").await.is_err());
    }

    #[tokio::test]
    async fn test_raw_documents_go_through_decode() {
        let store = MemoryStore::new();
        store
            .insert_raw_college(json!({ "$id": "half", "name": "Half Card" }))
            .await;

        let report = store.list_colleges().await.unwrap();
        assert!(report.cards.is_empty());
        assert_eq!(report.skipped[0].id, "half");
        assert!(matches!(
            store.get_college("half").await,
            Err(StoreError::InvalidResponse(_))
        ));
    }
}
