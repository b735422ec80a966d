use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::StudentProfile;

/// Email/password credentials for sign-in and sign-up
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Live drag update for the top card
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DragRequest {
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
}

/// Button-driven swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForceSwipeRequest {
    /// "like" or "dislike"
    #[validate(length(min = 1))]
    pub direction: String,
}

/// Profile editor save
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(nested)]
    pub profile: StudentProfile,
}

/// Ask the advisor whether a user's stored profile is likely to be admitted
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdmissionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "college_name", rename = "collegeName")]
    pub college_name: String,
}

/// Image proxy query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImageQuery {
    #[validate(url)]
    pub url: String,
}
