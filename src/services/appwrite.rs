use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::core::filters::{decode_college, decode_college_documents};
use crate::core::ports::{DocumentStore, StoreError};
use crate::models::{CollegeCard, Decision, FetchReport, StudentProfile, UserRecord};

/// Collection IDs in the document store
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub colleges: String,
    pub users: String,
}

impl Default for AppwriteCollections {
    fn default() -> Self {
        Self {
            colleges: "colleges".to_string(),
            users: "users".to_string(),
        }
    }
}

/// REST client for the remote document store
///
/// Handles all communication with the database including:
/// - Listing colleges for the deck
/// - Reading and creating `users/{userId}` records
/// - Set-union writes of likes and dislikes
pub struct AppwriteStore {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

impl AppwriteStore {
    /// Create a new store client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(collection),
            urlencoding::encode(document_id)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    /// Map non-success statuses onto store errors
    async fn check(response: Response, what: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthorized),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(what.to_string())),
            _ => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Store request for {} failed: {} - {}", what, status, body);
                Err(StoreError::ApiError(format!("{}: {}", what, status)))
            }
        }
    }

    async fn patch_user(&self, user_id: &str, data: Value) -> Result<(), StoreError> {
        let url = self.document_url(&self.collections.users, user_id);

        let response = self
            .authorized(self.client.patch(&url))
            .json(&json!({ "data": data }))
            .send()
            .await?;

        Self::check(response, &format!("user {}", user_id)).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn list_colleges(&self) -> Result<FetchReport, StoreError> {
        let url = self.documents_url(&self.collections.colleges);

        tracing::debug!("Fetching colleges from: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "colleges").await?;

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

        let report = decode_college_documents(documents);

        tracing::debug!(
            "Decoded {} colleges ({} skipped)",
            report.cards.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    async fn get_college(&self, college_id: &str) -> Result<CollegeCard, StoreError> {
        let url = self.document_url(&self.collections.colleges, college_id);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, &format!("college {}", college_id)).await?;

        let doc: Value = response.json().await?;

        decode_college(&doc).map_err(|skipped| {
            StoreError::InvalidResponse(format!("college {}: {}", skipped.id, skipped.reason))
        })
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, StoreError> {
        let url = self.document_url(&self.collections.users, user_id);

        tracing::debug!("Fetching user record: {}", user_id);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, &format!("user {}", user_id)).await?;

        let doc: Value = response.json().await?;
        let data = doc.get("data").unwrap_or(&doc);

        serde_json::from_value(data.clone())
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse user record: {}", e)))
    }

    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let url = self.documents_url(&self.collections.users);

        let mut data = serde_json::to_value(record)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if let Some(obj) = data.as_object_mut() {
            obj.remove("$id");
        }

        let response = self
            .authorized(self.client.post(&url))
            .json(&json!({ "documentId": record.user_id, "data": data }))
            .send()
            .await?;

        Self::check(response, &format!("user {}", record.user_id)).await?;

        tracing::debug!("Created user record {}", record.user_id);
        Ok(())
    }

    async fn add_decision(
        &self,
        user_id: &str,
        college_id: &str,
        decision: Decision,
    ) -> Result<bool, StoreError> {
        let mut record = match self.get_user(user_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                // Companion record never got created; start it with this decision
                tracing::warn!("No record for {}, creating it", user_id);
                let mut record = UserRecord::new(user_id, None);
                record.union(college_id, decision);
                self.create_user(&record).await?;
                return Ok(true);
            }
            Err(e) => return Err(e),
        };

        if !record.union(college_id, decision) {
            tracing::debug!("{} already in {} for {}", college_id, decision.field(), user_id);
            return Ok(false);
        }

        let ids = record.ids_for(decision).to_vec();
        self.patch_user(user_id, json!({ decision.field(): ids })).await?;

        tracing::debug!("Recorded {:?}: {} -> {}", decision, user_id, college_id);
        Ok(true)
    }

    async fn save_profile(&self, user_id: &str, profile: &StudentProfile) -> Result<(), StoreError> {
        let profile = serde_json::to_value(profile)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        self.patch_user(user_id, json!({ "profile": profile })).await
    }
}
