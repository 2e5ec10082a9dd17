use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::models::domain::{Gender, UserProfile};

/// Longest contact number accepted, country code included
pub const MAX_CONTACT_DIGITS: usize = 18;

#[derive(Debug, Error)]
pub enum ProfileValidationError {
    #[error("Validation failed: {0}")]
    Fields(#[from] validator::ValidationErrors),

    #[error("Enter a valid WhatsApp number: {0}")]
    InvalidContactNumber(String),
}

/// Request to find a match and notify the user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 18, max = 100))]
    pub age: u8,
    pub gender: Gender,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// WhatsApp number with country code, without `+`
    #[validate(length(min = 1))]
    pub number: String,
    #[serde(alias = "custom_prompt", rename = "customPrompt", default)]
    pub custom_prompt: Option<String>,
}

impl FindMatchRequest {
    /// Validate the request and turn it into the engine's immutable profile
    pub fn into_profile(self) -> Result<UserProfile, ProfileValidationError> {
        self.validate()?;

        if self.name.trim().is_empty() {
            let mut errors = validator::ValidationErrors::new();
            errors.add("name", validator::ValidationError::new("blank"));
            return Err(errors.into());
        }

        let contact_number = normalize_contact_number(&self.number)?;

        Ok(UserProfile {
            name: self.name.trim().to_string(),
            age: self.age,
            gender: self.gender,
            profession: trimmed(self.profession),
            education: trimmed(self.education),
            location: trimmed(self.location),
            contact_number,
            preference: trimmed(self.custom_prompt),
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strip spaces and dashes, then require a digit-only number of bounded length
pub fn normalize_contact_number(raw: &str) -> Result<String, ProfileValidationError> {
    let number: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if number.is_empty() || number.len() > MAX_CONTACT_DIGITS {
        return Err(ProfileValidationError::InvalidContactNumber(format!(
            "expected 1 to {} digits",
            MAX_CONTACT_DIGITS
        )));
    }

    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ProfileValidationError::InvalidContactNumber(
            "only digits, spaces and dashes are allowed".to_string(),
        ));
    }

    Ok(number)
}
