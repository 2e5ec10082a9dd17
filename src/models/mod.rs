// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    same_text, AgeRule, CandidateProfile, Dimension, DispatchStatus, Gender, LocationRule,
    MatchOutcome, ProfessionRule, ResolvedConstraints, UserProfile, NO_MATCH_MESSAGE,
    SENT_CONFIRMATION,
};
pub use requests::{FindMatchRequest, ProfileValidationError};
pub use responses::{ErrorResponse, FindMatchResponse, HealthResponse};
