use serde::{Deserialize, Serialize};

use crate::models::domain::{CollegeCard, Decision, SkippedDocument};

/// Transient label shown over the top card while dragging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwipeLabel {
    Like,
    Nope,
}

/// Snapshot of a user's deck, everything a client needs to render it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckView {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub remaining: usize,
    #[serde(rename = "topCard")]
    pub top_card: Option<CollegeCard>,
    pub phase: String,
    #[serde(rename = "translationX")]
    pub translation_x: f64,
    #[serde(rename = "translationY")]
    pub translation_y: f64,
    #[serde(rename = "rotationDegrees")]
    pub rotation_degrees: f64,
    pub label: Option<SwipeLabel>,
    #[serde(rename = "isEmpty")]
    pub is_empty: bool,
    /// Like/dislike buttons; reload is always available
    #[serde(rename = "buttonsEnabled")]
    pub buttons_enabled: bool,
    pub generation: u64,
}

/// Result of a release or a button swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    /// "committed", "cancelled" or "ignored"
    pub outcome: String,
    pub decision: Option<Decision>,
    #[serde(rename = "cardId")]
    pub card_id: Option<String>,
    #[serde(rename = "exitAfterMs")]
    pub exit_after_ms: Option<u64>,
    pub deck: DeckView,
}

/// Liked colleges for the likes screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedCollegesResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub count: usize,
    pub colleges: Vec<CollegeCard>,
    pub skipped: Vec<SkippedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedCountResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionResponse {
    #[serde(rename = "collegeName")]
    pub college_name: String,
    #[serde(rename = "likelyAdmitted")]
    pub likely_admitted: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}
