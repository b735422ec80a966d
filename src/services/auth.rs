use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use validator::Validate;

use crate::core::ports::DocumentStore;
use crate::models::{AuthSession, CredentialsRequest, UserRecord};

/// Errors surfaced to the user on sign-in or sign-up
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error("Identity service error: {0}")]
    Service(String),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Email/password identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Register a new account and return its user id
    async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthError>;
}

/// Identity service reached over the `/account` REST endpoints
pub struct AppwriteAccounts {
    base_url: String,
    project_id: String,
    client: Client,
}

impl AppwriteAccounts {
    pub fn new(base_url: String, project_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            project_id,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string())
    }
}

#[async_trait]
impl IdentityProvider for AppwriteAccounts {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.url("/account/sessions/email"))
            .header("X-Appwrite-Project", &self.project_id)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(AuthError::InvalidCredentials),
            StatusCode::BAD_REQUEST => {
                return Err(AuthError::Validation(Self::error_message(response).await))
            }
            _ => return Err(AuthError::Service(Self::error_message(response).await)),
        }

        let body: Value = response.json().await?;
        let field = |name: &str| {
            body.get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| AuthError::Service(format!("session response missing {}", name)))
        };

        Ok(AuthSession {
            user_id: field("userId")?,
            email: email.to_string(),
            session_id: field("$id")?,
        })
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user_id = uuid::Uuid::new_v4().simple().to_string();

        let response = self
            .client
            .post(self.url("/account"))
            .header("X-Appwrite-Project", &self.project_id)
            .json(&json!({ "userId": user_id, "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::CONFLICT => return Err(AuthError::EmailTaken),
            StatusCode::BAD_REQUEST => {
                return Err(AuthError::Validation(Self::error_message(response).await))
            }
            _ => return Err(AuthError::Service(Self::error_message(response).await)),
        }

        let body: Value = response.json().await?;
        Ok(body
            .get("$id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or(user_id))
    }
}

/// In-process identity service for `store.backend = "memory"` and tests
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: RwLock<HashMap<String, (String, String)>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryAccounts {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let accounts = self.accounts.read().await;
        match accounts.get(email) {
            Some((stored, user_id)) if stored == password => Ok(AuthSession {
                user_id: user_id.clone(),
                email: email.to_string(),
                session_id: uuid::Uuid::new_v4().to_string(),
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        let user_id = uuid::Uuid::new_v4().simple().to_string();
        accounts.insert(email.to_string(), (password.to_string(), user_id.clone()));
        Ok(user_id)
    }
}

/// Sign-in and sign-up, including the companion user record on sign-up
pub struct Authenticator {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

impl Authenticator {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    fn validated(request: &CredentialsRequest) -> Result<String, AuthError> {
        request
            .validate()
            .map_err(|errors| AuthError::Validation(errors.to_string()))?;
        Ok(request.email.trim().to_lowercase())
    }

    pub async fn sign_in(&self, request: &CredentialsRequest) -> Result<AuthSession, AuthError> {
        let email = Self::validated(request)?;
        let session = self.identity.sign_in(&email, &request.password).await?;
        tracing::info!("User {} signed in", session.user_id);
        Ok(session)
    }

    pub async fn sign_up(&self, request: &CredentialsRequest) -> Result<AuthSession, AuthError> {
        let email = Self::validated(request)?;
        let user_id = self.identity.create_account(&email, &request.password).await?;

        let record = UserRecord::new(user_id.clone(), Some(email.clone()));
        if let Err(e) = self.store.create_user(&record).await {
            // Account exists either way; the first decision creates the record
            tracing::error!("Failed to create user record for {}: {}", user_id, e);
        }

        tracing::info!("User {} signed up", user_id);
        self.identity.sign_in(&email, &request.password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;

    fn credentials(email: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn authenticator() -> (Arc<MemoryStore>, Authenticator) {
        let store = Arc::new(MemoryStore::new());
        let auth = Authenticator::new(Arc::new(MemoryAccounts::new()), store.clone());
        (store, auth)
    }

    #[tokio::test]
    async fn test_sign_up_creates_user_record() {
        let (store, auth) = authenticator();
        let session = auth
            .sign_up(&credentials("Student@Example.com", "hunter22"))
            .await
            .unwrap();

        assert_eq!(session.email, "student@example.com");
        let record = store.get_user(&session.user_id).await.unwrap();
        assert!(record.liked_colleges.is_empty());
        assert_eq!(record.email.as_deref(), Some("student@example.com"));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let (_store, auth) = authenticator();
        auth.sign_up(&credentials("a@b.com", "hunter22")).await.unwrap();

        let err = auth.sign_in(&credentials("a@b.com", "wrong-pass")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let (_store, auth) = authenticator();
        auth.sign_up(&credentials("a@b.com", "hunter22")).await.unwrap();
        let err = auth.sign_up(&credentials("a@b.com", "hunter22")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_short_password_fails_validation() {
        let (_store, auth) = authenticator();
        let err = auth.sign_up(&credentials("a@b.com", "123")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_remote_sign_in_maps_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/account/sessions/email")
            .with_status(401)
            .with_body(r#"{"message":"Invalid credentials"}"#)
            .create_async()
            .await;

        let accounts = AppwriteAccounts::new(server.url(), "project".to_string());
        let err = accounts.sign_in("a@b.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_remote_sign_in_parses_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/account/sessions/email")
            .match_header("X-Appwrite-Project", "project")
            .with_status(201)
            .with_body(r#"{"$id":"sess1","userId":"user1"}"#)
            .create_async()
            .await;

        let accounts = AppwriteAccounts::new(server.url(), "project".to_string());
        let session = accounts.sign_in("a@b.com", "hunter22").await.unwrap();
        assert_eq!(session.user_id, "user1");
        assert_eq!(session.session_id, "sess1");
    }
}
