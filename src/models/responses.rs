use serde::{Deserialize, Serialize};
use crate::models::domain::{CandidateProfile, DispatchStatus, MatchOutcome, ResolvedConstraints};

/// Response for the find match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub outcome: String,
    pub matched: bool,
    pub selected: Option<CandidateProfile>,
    pub constraints: Option<ResolvedConstraints>,
    pub reasoning: String,
    #[serde(rename = "dispatchStatus")]
    pub dispatch_status: DispatchStatus,
}

impl From<MatchOutcome> for FindMatchResponse {
    fn from(outcome: MatchOutcome) -> Self {
        Self {
            request_id: outcome.request_id.to_string(),
            outcome: outcome.summary(),
            matched: outcome.is_match(),
            selected: outcome.selected,
            constraints: outcome.constraints,
            reasoning: outcome.reasoning,
            dispatch_status: outcome.dispatch_status,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "catalogSize")]
    pub catalog_size: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
