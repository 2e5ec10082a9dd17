use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::{
    dispatcher::{justify, Dispatcher},
    filters::{prefilter, Eligible, PreFilterOptions},
    interpreter::PreferenceInterpreter,
    matcher::Matcher,
};
use crate::models::{CandidateProfile, MatchOutcome, ResolvedConstraints, UserProfile};
use crate::services::{ProfileStore, ReasoningClient};

/// Stages of one match request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filtering,
    Interpreting,
    Selecting,
    Dispatching,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Filtering => "filtering",
            Stage::Interpreting => "interpreting",
            Stage::Selecting => "selecting",
            Stage::Dispatching => "dispatching",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Working state of a single request. Lives on the stack of `MatchEngine::run`
/// and is never shared between requests.
struct RequestState<'a> {
    id: Uuid,
    stage: Stage,
    trail: Vec<Stage>,
    eligible: Eligible<'a>,
    constraints: Option<ResolvedConstraints>,
    selected: Option<&'a CandidateProfile>,
}

impl<'a> RequestState<'a> {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Filtering,
            trail: vec![Stage::Filtering],
            eligible: Eligible::Empty,
            constraints: None,
            selected: None,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!("{} -> {}", self.stage, next);
        self.stage = next;
        self.trail.push(next);
    }
}

/// Outcome plus the stages the request went through
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub outcome: MatchOutcome,
    pub stages: Vec<Stage>,
}

/// Decision Orchestrator
///
/// # Pipeline Stages
/// 1. Filtering - deterministic pre-filter over the catalog
/// 2. Interpreting - preference statement to resolved constraints
/// 3. Selecting - hard-filter selection of at most one candidate
/// 4. Dispatching - one WhatsApp message for a selected candidate
///
/// An empty candidate set after stage 1 or 3 goes straight to `Done` with the
/// no-match outcome and nothing is sent.
pub struct MatchEngine {
    store: ProfileStore,
    prefilter: PreFilterOptions,
    interpreter: Arc<dyn PreferenceInterpreter>,
    matcher: Matcher,
    dispatcher: Dispatcher,
    explainer: Option<Arc<dyn ReasoningClient>>,
    explain_timeout: Duration,
}

impl MatchEngine {
    pub fn new(
        store: ProfileStore,
        prefilter: PreFilterOptions,
        interpreter: Arc<dyn PreferenceInterpreter>,
        matcher: Matcher,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            store,
            prefilter,
            interpreter,
            matcher,
            dispatcher,
            explainer: None,
            explain_timeout: Duration::from_secs(30),
        }
    }

    /// Let the reasoning component reword the justification before sending
    pub fn with_explainer(mut self, explainer: Arc<dyn ReasoningClient>, timeout: Duration) -> Self {
        self.explainer = Some(explainer);
        self.explain_timeout = timeout;
        self
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Run one request and return the final outcome
    pub async fn find_match(&self, user: &UserProfile) -> MatchOutcome {
        self.run(user).await.outcome
    }

    /// Run one request, also reporting the stages it went through.
    ///
    /// Everything logged while the request runs, interpreter and dispatcher
    /// included, is recorded inside a `match_request` span carrying `request_id`.
    pub async fn run(&self, user: &UserProfile) -> EngineRun {
        let state = RequestState::new();
        let span = info_span!("match_request", request_id = %state.id);
        self.run_stages(user, state).instrument(span).await
    }

    async fn run_stages<'a>(&'a self, user: &UserProfile, mut state: RequestState<'a>) -> EngineRun {
        info!("Finding match for {} ({}, {})", user.name, user.age, user.gender);

        // Stage 1: deterministic pre-filter
        state.eligible = prefilter(self.store.profiles(), user, &self.prefilter);
        debug!(
            "{} of {} candidates passed the pre-filter",
            state.eligible.len(),
            self.store.len()
        );

        if state.eligible.is_empty() {
            return Self::finish_without_match(state);
        }

        // Stage 2: interpretation
        state.advance(Stage::Interpreting);
        let statement = user.preference_statement().unwrap_or("");
        let constraints = self.interpreter.interpret(statement, user).await;
        debug!("Resolved constraints: {:?}", constraints);

        // Stage 3: selection
        state.advance(Stage::Selecting);
        state.selected = self
            .matcher
            .select(state.eligible.as_slice(), &constraints, user);

        let Some(candidate) = state.selected else {
            state.constraints = Some(constraints);
            return Self::finish_without_match(state);
        };

        // Stage 4: dispatch
        state.advance(Stage::Dispatching);
        let reasoning = self.explain(user, candidate, &constraints).await;
        state.constraints = Some(constraints);
        let report = self
            .dispatcher
            .dispatch(user, Some(candidate), &reasoning)
            .await;

        state.advance(Stage::Done);
        info!(
            "Selected {} for {}, dispatch {:?}",
            candidate.name, user.name, report.status
        );

        EngineRun {
            outcome: MatchOutcome {
                request_id: state.id,
                selected: Some(candidate.clone()),
                constraints: state.constraints,
                reasoning,
                dispatch_status: report.status,
                delivery_error: report.error,
            },
            stages: state.trail,
        }
    }

    fn finish_without_match(mut state: RequestState<'_>) -> EngineRun {
        info!("No match found during {}", state.stage);
        state.advance(Stage::Done);

        EngineRun {
            outcome: MatchOutcome::no_match(state.id, state.constraints),
            stages: state.trail,
        }
    }

    /// Deterministic justification, optionally reworded by the reasoning component
    async fn explain(
        &self,
        user: &UserProfile,
        candidate: &CandidateProfile,
        constraints: &ResolvedConstraints,
    ) -> String {
        let draft = justify(candidate, constraints);

        let Some(explainer) = &self.explainer else {
            return draft;
        };

        let call = explainer.explain_match(user, candidate, constraints, &draft);
        match tokio::time::timeout(self.explain_timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => draft,
            Ok(Err(e)) => {
                warn!("Justification rewrite failed, using draft: {}", e);
                draft
            }
            Err(_) => {
                warn!(
                    "Justification rewrite timed out after {:?}, using draft",
                    self.explain_timeout
                );
                draft
            }
        }
    }
}
