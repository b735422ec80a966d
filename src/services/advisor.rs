use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::StudentProfile;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Advisor API key is not configured")]
    NotConfigured,
}

/// Asks a completions endpoint whether a student is likely to be admitted
pub struct AdmissionAdvisor {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl AdmissionAdvisor {
    pub fn new(endpoint: String, api_key: Option<String>, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Likely-admitted verdict. Any failure is logged and reads as `false`.
    pub async fn check_admission(&self, profile: &StudentProfile, college_name: &str) -> bool {
        match self.ask(profile, college_name).await {
            Ok(answer) => interpret_answer(&answer),
            Err(e) => {
                tracing::warn!("Admission check for {} failed: {}", college_name, e);
                false
            }
        }
    }

    async fn ask(&self, profile: &StudentProfile, college_name: &str) -> Result<String, AdvisorError> {
        let api_key = self.api_key.as_ref().ok_or(AdvisorError::NotConfigured)?;

        let body = json!({
            "model": self.model,
            "prompt": build_prompt(profile, college_name),
            "max_tokens": 10,
            "temperature": 0.0,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::InvalidResponse(format!(
                "advisor returned {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(String::from)
            .ok_or_else(|| AdvisorError::InvalidResponse("missing choices[0].text".into()))
    }
}

/// Prompt describing the student, asking for a bare yes or no
pub fn build_prompt(profile: &StudentProfile, college_name: &str) -> String {
    format!(
        "The student has these stats:\n\
         Name: {}\n\
         Grade: {}\n\
         GPA: {}\n\
         SAT/ACT: {}\n\
         Extracurriculars: {}\n\
         Public school: {}\n\
         \n\
         Based on these stats, do you think they will get admitted to {}?\n\
         Answer ONLY yes or no.",
        profile.name,
        profile.grade,
        profile.gpa,
        profile.test_score,
        profile.extracurriculars,
        if profile.is_public_school { "Yes" } else { "No" },
        college_name,
    )
}

#[inline]
pub fn interpret_answer(answer: &str) -> bool {
    answer.to_lowercase().contains("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_profile_and_college() {
        let prompt = build_prompt(&StudentProfile::default(), "Caltech");
        assert!(prompt.contains("Name: John Doe"));
        assert!(prompt.contains("SAT/ACT: SAT: 1450"));
        assert!(prompt.contains("Public school: Yes"));
        assert!(prompt.contains("admitted to Caltech?"));
    }

    #[test]
    fn test_interpret_answer() {
        assert!(interpret_answer(" Yes."));
        assert!(!interpret_answer("No"));
        assert!(!interpret_answer(""));
    }

    #[tokio::test]
    async fn test_unconfigured_advisor_says_no() {
        let advisor = AdmissionAdvisor::new("http://unused".into(), None, "m".into());
        assert!(!advisor.is_configured());
        assert!(!advisor.check_admission(&StudentProfile::default(), "MIT").await);
    }

    #[tokio::test]
    async fn test_reads_first_choice() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(r#"{"choices":[{"text":"\nYes"}]}"#)
            .create_async()
            .await;

        let advisor = AdmissionAdvisor::new(
            format!("{}/v1/completions", server.url()),
            Some("sk-test".into()),
            "gpt-3.5-turbo-instruct".into(),
        );
        assert!(advisor.check_admission(&StudentProfile::default(), "Yale").await);
    }
}
