// Core algorithm exports
pub mod dispatcher;
pub mod filters;
pub mod interpreter;
pub mod matcher;
pub mod orchestrator;
pub mod scoring;

pub use dispatcher::{compose_message, justify, DispatchReport, Dispatcher, TransportError};
pub use filters::{prefilter, satisfies_all, Eligible, PreFilterOptions};
pub use interpreter::{
    DelegatingInterpreter, PreferenceInterpreter, RuleBasedInterpreter, RuleParse, Vocabulary,
};
pub use matcher::{Matcher, TieBreak};
pub use orchestrator::{EngineRun, MatchEngine, Stage};
pub use scoring::{compatibility_score, SelectionPenalties};
