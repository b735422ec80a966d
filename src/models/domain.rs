use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

/// Highest value any of the 0-5 college ratings may take
pub const MAX_RATING: u8 = 5;

/// A single swipeable college, as stored in the `colleges` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeCard {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    /// Founding year
    pub year: i32,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(flatten)]
    pub details: CollegeDetails,
}

/// Extended attribute set. Every field is optional so older documents
/// that only carry the basic card still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athletics_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dining_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_life_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub majors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl CollegeCard {
    /// Check the parts of the schema serde cannot express.
    ///
    /// Returns a human readable reason on the first violation.
    pub fn check_contract(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("missing document id".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("empty college name".to_string());
        }

        let ratings = [
            ("athleticsRating", self.details.athletics_rating),
            ("diningRating", self.details.dining_rating),
            ("socialLifeRating", self.details.social_life_rating),
        ];
        for (field, rating) in ratings {
            if let Some(value) = rating {
                if value > MAX_RATING {
                    return Err(format!("{} out of range: {}", field, value));
                }
            }
        }

        Ok(())
    }
}

/// Outcome of a committed swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Liked,
    Disliked,
}

impl Decision {
    /// Array field under `users/{userId}` that collects this outcome
    pub fn field(&self) -> &'static str {
        match self {
            Decision::Liked => "likedColleges",
            Decision::Disliked => "dislikedColleges",
        }
    }

    /// Parse the button vocabulary used by clients
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "like" | "liked" => Some(Decision::Liked),
            "dislike" | "disliked" | "nope" => Some(Decision::Disliked),
            _ => None,
        }
    }
}

/// A decision ready to be written to the user's record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "cardId")]
    pub card_id: String,
    pub decision: Decision,
    #[serde(rename = "decidedAt")]
    pub decided_at: chrono::DateTime<chrono::Utc>,
}

/// Companion record kept under `users/{userId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "$id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "likedColleges", default)]
    pub liked_colleges: Vec<String>,
    #[serde(rename = "dislikedColleges", default)]
    pub disliked_colleges: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<StudentProfile>,
}

impl UserRecord {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            ..Default::default()
        }
    }

    /// Every college this user has already liked or disliked
    pub fn decided(&self) -> HashSet<String> {
        self.liked_colleges
            .iter()
            .chain(self.disliked_colleges.iter())
            .cloned()
            .collect()
    }

    pub fn ids_for(&self, decision: Decision) -> &[String] {
        match decision {
            Decision::Liked => &self.liked_colleges,
            Decision::Disliked => &self.disliked_colleges,
        }
    }

    /// Set-union `card_id` into the array for `decision`.
    ///
    /// Returns false when the id was already present.
    pub fn union(&mut self, card_id: &str, decision: Decision) -> bool {
        let ids = match decision {
            Decision::Liked => &mut self.liked_colleges,
            Decision::Disliked => &mut self.disliked_colleges,
        };
        if ids.iter().any(|id| id == card_id) {
            return false;
        }
        ids.push(card_id.to_string());
        true
    }
}

/// Student profile edited on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 1, max = 12))]
    pub grade: u8,
    #[validate(range(min = 0.0, max = 5.0))]
    pub gpa: f64,
    /// Free-form score, e.g. "SAT: 1450"
    #[serde(rename = "satOrAct")]
    pub test_score: String,
    pub extracurriculars: String,
    pub is_public_school: bool,
    #[serde(default)]
    pub intended_major: Option<String>,
    #[serde(default)]
    pub academic_honors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<u8>>,
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self {
            name: "John Doe".to_string(),
            grade: 11,
            gpa: 3.8,
            test_score: "SAT: 1450".to_string(),
            extracurriculars: "Soccer team, Debate Club, Robotics".to_string(),
            is_public_school: true,
            intended_major: Some("Computer Science".to_string()),
            academic_honors: Some("National Merit Semifinalist".to_string()),
            image_data: None,
        }
    }
}

impl StudentProfile {
    /// Blank optional text fields are stored as absent
    pub fn normalized(mut self) -> Self {
        self.intended_major = self.intended_major.filter(|s| !s.trim().is_empty());
        self.academic_honors = self.academic_honors.filter(|s| !s.trim().is_empty());
        self
    }
}

/// A remote document that could not be turned into a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub id: String,
    pub reason: String,
}

/// Result of a fetch that tolerates per-document failures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchReport {
    pub cards: Vec<CollegeCard>,
    pub skipped: Vec<SkippedDocument>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_basic_card() {
        let doc = json!({
            "$id": "harvard",
            "name": "Harvard University",
            "year": 1636,
            "desc": "Ivy League in Cambridge, MA",
            "imageURL": "https://img.test/harvard.png"
        });

        let card: CollegeCard = serde_json::from_value(doc).unwrap();
        assert_eq!(card.id, "harvard");
        assert_eq!(card.year, 1636);
        assert_eq!(card.details, CollegeDetails::default());
        assert!(card.check_contract().is_ok());
    }

    #[test]
    fn test_decode_extended_card() {
        let doc = json!({
            "$id": "mit",
            "name": "MIT",
            "year": 1861,
            "desc": "Research in Cambridge, MA",
            "imageURL": "https://img.test/mit.png",
            "athleticsRating": 3,
            "diningRating": 4,
            "socialLifeRating": 2,
            "institutionType": "Private",
            "ranking": 2,
            "majors": ["Physics", "EECS"]
        });

        let card: CollegeCard = serde_json::from_value(doc).unwrap();
        assert_eq!(card.details.dining_rating, Some(4));
        assert_eq!(card.details.majors.len(), 2);
    }

    #[test]
    fn test_rating_out_of_range_breaks_contract() {
        let doc = json!({
            "$id": "x",
            "name": "X College",
            "year": 1900,
            "desc": "",
            "imageURL": "",
            "diningRating": 9
        });

        let card: CollegeCard = serde_json::from_value(doc).unwrap();
        let reason = card.check_contract().unwrap_err();
        assert!(reason.contains("diningRating"));
    }

    #[test]
    fn test_union_is_idempotent() {
        let mut record = UserRecord::new("u1", None);
        assert!(record.union("mit", Decision::Liked));
        assert!(!record.union("mit", Decision::Liked));
        assert_eq!(record.liked_colleges, vec!["mit"]);
        assert!(record.disliked_colleges.is_empty());
    }

    #[test]
    fn test_decided_covers_both_sets() {
        let mut record = UserRecord::new("u1", None);
        record.union("mit", Decision::Liked);
        record.union("yale", Decision::Disliked);

        let decided = record.decided();
        assert!(decided.contains("mit"));
        assert!(decided.contains("yale"));
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("like"), Some(Decision::Liked));
        assert_eq!(Decision::parse("NOPE"), Some(Decision::Disliked));
        assert_eq!(Decision::parse("reload"), None);
        assert_eq!(Decision::Liked.field(), "likedColleges");
    }

    #[test]
    fn test_profile_round_trips_swift_field_names() {
        let profile = StudentProfile::default();
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("satOrAct").is_some());
        assert!(value.get("isPublicSchool").is_some());
        assert!(value.get("imageData").is_none());
    }

    #[test]
    fn test_profile_normalized_drops_blank_optionals() {
        let mut profile = StudentProfile::default();
        profile.intended_major = Some("  ".to_string());
        let profile = profile.normalized();
        assert_eq!(profile.intended_major, None);
        assert!(profile.academic_honors.is_some());
    }
}
