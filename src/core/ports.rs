//! Boundary between the deck core and the remote document store.
//!
//! The deck never talks to the network directly; the services layer hands
//! it whatever implementation of [`DocumentStore`] the configuration picks.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CollegeCard, Decision, FetchReport, StudentProfile, UserRecord};

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Remote document store holding `colleges` and `users/{userId}`
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every college document. Documents that fail to decode are reported
    /// in `FetchReport::skipped` instead of failing the whole call.
    async fn list_colleges(&self) -> Result<FetchReport, StoreError>;

    async fn get_college(&self, college_id: &str) -> Result<CollegeCard, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, StoreError>;

    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Set-union `college_id` into the user's array for `decision`.
    ///
    /// Returns `Ok(false)` when the id was already there and nothing changed.
    async fn add_decision(
        &self,
        user_id: &str,
        college_id: &str,
        decision: Decision,
    ) -> Result<bool, StoreError>;

    async fn save_profile(&self, user_id: &str, profile: &StudentProfile) -> Result<(), StoreError>;
}
