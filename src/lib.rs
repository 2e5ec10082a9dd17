//! Rishta Match - matching and WhatsApp notification engine for Rishta Bot
//!
//! This library provides the decision engine behind Rishta Bot: a deterministic
//! pre-filter over the rishta catalog, a preference interpreter, a hard-filter
//! selector and a dispatcher that sends exactly one WhatsApp message per match.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{MatchEngine, Matcher, PreferenceInterpreter, RuleBasedInterpreter};
pub use models::{CandidateProfile, MatchOutcome, ResolvedConstraints, UserProfile, NO_MATCH_MESSAGE};
