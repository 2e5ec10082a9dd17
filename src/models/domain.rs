use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal outcome reported when no candidate survives filtering or selection.
pub const NO_MATCH_MESSAGE: &str = "No match found in the data. Try adjusting your preferences.";

/// Confirmation appended to the justification once the notification is delivered.
pub const SENT_CONFIRMATION: &str = "Message successfully sent to WhatsApp.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("Male"),
            Gender::Female => f.write_str("Female"),
        }
    }
}

/// Validated profile of the person asking for a match.
///
/// Built from a `FindMatchRequest` once validation has passed; the engine never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "number")]
    pub contact_number: String,
    #[serde(rename = "customPrompt", default)]
    pub preference: Option<String>,
}

impl UserProfile {
    /// Preference statement with surrounding whitespace removed, `None` when blank
    pub fn preference_statement(&self) -> Option<&str> {
        self.preference
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn profession(&self) -> Option<&str> {
        non_blank(self.profession.as_deref())
    }

    pub fn education(&self) -> Option<&str> {
        non_blank(self.education.as_deref())
    }

    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }
}

/// A profile from the rishta catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl CandidateProfile {
    pub fn profession(&self) -> Option<&str> {
        non_blank(self.profession.as_deref())
    }

    pub fn education(&self) -> Option<&str> {
        non_blank(self.education.as_deref())
    }

    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Case-insensitive comparison used by every text rule
pub fn same_text(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Age rule; bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AgeRule {
    Exact { age: u8 },
    Min { age: u8 },
    Max { age: u8 },
    Between { min: u8, max: u8 },
    /// Within `spread` years of `around`, which is the user's age.
    Range { around: u8, spread: u8 },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum ProfessionRule {
    Exact(String),
    SameAsUser(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum LocationRule {
    Exact(String),
    SameAsUser(String),
    Any,
}

/// Constraint set produced by the preference interpreter. Every dimension always
/// holds exactly one concrete rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConstraints {
    pub age: AgeRule,
    pub profession: ProfessionRule,
    pub location: LocationRule,
}

/// The three preference dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Age,
    Profession,
    Location,
}

/// Outcome of the notification stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Failed,
    Skipped,
}

/// Request-scoped result returned by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    #[serde(rename = "requestId")]
    pub request_id: uuid::Uuid,
    pub selected: Option<CandidateProfile>,
    pub constraints: Option<ResolvedConstraints>,
    pub reasoning: String,
    #[serde(rename = "dispatchStatus")]
    pub dispatch_status: DispatchStatus,
    /// Transport failure detail when `dispatch_status` is `Failed`
    #[serde(rename = "deliveryError")]
    pub delivery_error: Option<String>,
}

impl MatchOutcome {
    pub fn no_match(request_id: uuid::Uuid, constraints: Option<ResolvedConstraints>) -> Self {
        Self {
            request_id,
            selected: None,
            constraints,
            reasoning: NO_MATCH_MESSAGE.to_string(),
            dispatch_status: DispatchStatus::Skipped,
            delivery_error: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.selected.is_some()
    }

    /// Human-readable outcome string handed back to the caller.
    pub fn summary(&self) -> String {
        match (&self.selected, self.dispatch_status) {
            (None, _) => NO_MATCH_MESSAGE.to_string(),
            (Some(_), DispatchStatus::Sent) => format!("{}\n\n{}", self.reasoning, SENT_CONFIRMATION),
            (Some(_), DispatchStatus::Failed) => format!(
                "{}\n\nMatch found, but the WhatsApp message could not be delivered: {}",
                self.reasoning,
                self.delivery_error.as_deref().unwrap_or("unknown error")
            ),
            (Some(_), DispatchStatus::Skipped) => self.reasoning.clone(),
        }
    }
}
