use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CandidateProfile, ResolvedConstraints, UserProfile};

/// Errors that can occur when talking to the reasoning provider
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Structured constraint answer from the reasoning component.
///
/// Each dimension is kept as raw JSON so that a malformed dimension can be
/// rejected on its own without discarding the others.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelegatedConstraints {
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub profession: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
}

/// The non-deterministic reasoning component.
///
/// Used for two things only: extracting constraints from a free-text statement
/// and rewording the justification of a match. Whether a notification is sent
/// is never decided here.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn extract_constraints(
        &self,
        statement: &str,
        profile: &UserProfile,
    ) -> Result<DelegatedConstraints, ReasoningError>;

    async fn explain_match(
        &self,
        user: &UserProfile,
        candidate: &CandidateProfile,
        constraints: &ResolvedConstraints,
        draft: &str,
    ) -> Result<String, ReasoningError>;
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are Rishta Bot's preference reader. Read the user's match preference and answer with one JSON object and nothing else:
{"age": {"rule": "exact", "age": N} | {"rule": "min", "age": N} | {"rule": "max", "age": N} | {"rule": "between", "min": N, "max": N} | {"rule": "range", "spread": N} | {"rule": "none"},
 "profession": {"rule": "exact", "value": "..."} | {"rule": "same_as_user"} | {"rule": "none"},
 "location": {"rule": "exact", "value": "..."} | {"rule": "same_as_user"} | {"rule": "any"}}
Bounds are inclusive, so "older than 28" is {"rule": "min", "age": 29}. Resolve "older/younger than me" against the user's age.
Give exactly one rule per dimension. If the text says nothing about a dimension, omit that key."#;

const EXPLANATION_INSTRUCTIONS: &str = "You are Rishta Bot, a matchmaking assistant. Rewrite the draft reasoning as one friendly sentence that starts with 'This match was chosen because' and mentions only the facts in the draft. Do not list other candidates. Answer with the sentence only.";

/// Client for an OpenAI-compatible chat completions endpoint
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl ChatCompletionsClient {
    /// Create a new client; `timeout` bounds every HTTP exchange
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            model,
            client,
        })
    }

    async fn complete(
        &self,
        instructions: &str,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String, ReasoningError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut body = json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": instructions},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.1
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        tracing::debug!("Calling reasoning provider at {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReasoningError::ApiError(format!("{}: {}", status, text)));
        }

        let json: Value = response.json().await?;

        json.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReasoningError::InvalidResponse("Missing message content".into()))
    }
}

#[async_trait]
impl ReasoningClient for ChatCompletionsClient {
    async fn extract_constraints(
        &self,
        statement: &str,
        profile: &UserProfile,
    ) -> Result<DelegatedConstraints, ReasoningError> {
        let prompt = format!(
            "User age: {}\nUser gender: {}\nUser profession: {}\nUser location: {}\nPreference: {}",
            profile.age,
            profile.gender,
            profile.profession().unwrap_or("not provided"),
            profile.location().unwrap_or("not provided"),
            statement
        );

        let content = self.complete(EXTRACTION_INSTRUCTIONS, &prompt, true).await?;

        serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| ReasoningError::InvalidResponse(format!("Failed to parse constraints: {}", e)))
    }

    async fn explain_match(
        &self,
        user: &UserProfile,
        candidate: &CandidateProfile,
        constraints: &ResolvedConstraints,
        draft: &str,
    ) -> Result<String, ReasoningError> {
        let prompt = format!(
            "User: {} ({} years)\nMatch: {} ({} years)\nRules applied: {}\nDraft: {}",
            user.name,
            user.age,
            candidate.name,
            candidate.age,
            serde_json::to_string(constraints)
                .map_err(|e| ReasoningError::InvalidResponse(e.to_string()))?,
            draft
        );

        self.complete(EXPLANATION_INSTRUCTIONS, &prompt, false).await
    }
}

/// Models sometimes wrap JSON in a markdown fence even in JSON mode
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
