//! Preference interpretation - turns a free-text statement into one rule per dimension.
//!
//! Two implementations sit behind [`PreferenceInterpreter`]:
//! - [`RuleBasedInterpreter`] parses the statement with fixed phrase rules and is
//!   fully deterministic.
//! - [`DelegatingInterpreter`] runs the same rules first and asks the reasoning
//!   component once when the statement is ambiguous or mixes clauses.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{
    same_text, AgeRule, Dimension, LocationRule, ProfessionRule, ResolvedConstraints, UserProfile,
};
use crate::services::{DelegatedConstraints, ProfileStore, ReasoningClient};

/// Default `±` spread of the age range used when the statement says nothing about age
pub const DEFAULT_AGE_SPREAD: u8 = 3;

pub const KNOWN_CITIES: &[&str] = &[
    "Karachi",
    "Lahore",
    "Islamabad",
    "Rawalpindi",
    "Faisalabad",
    "Peshawar",
];

pub const KNOWN_PROFESSIONS: &[&str] = &[
    "Doctor",
    "Engineer",
    "Software Engineer",
    "AI Engineer",
    "Developer",
    "Designer",
    "Teacher",
    "Lawyer",
    "Accountant",
    "Banker",
    "Architect",
    "Pharmacist",
    "Nurse",
    "Businessman",
    "Data Scientist",
];

const NEGATIONS: &[&str] = &["not", "no", "except", "without", "never", "nor"];
const MIXED_CLAUSE_MARKERS: &[&str] = &["but", "or", "either", "unless", "prefer", "preferably", "ideally"];
const NUMBER_FILLERS: &[&str] = &["than", "age", "of", "is", "the"];
/// Tokens before a match that a negation may sit at ("not from my city")
const NEGATION_WINDOW: usize = 2;
/// Bare "N years" below this is read as something other than an age
const MIN_ADULT_AGE: u8 = 18;

/// Converts a preference statement plus the user profile into resolved constraints.
///
/// Implementations never fail: anything they cannot resolve falls back to the
/// default rule for that dimension.
#[async_trait]
pub trait PreferenceInterpreter: Send + Sync {
    async fn interpret(&self, statement: &str, profile: &UserProfile) -> ResolvedConstraints;
}

/// Rules used when the statement is silent on a dimension.
///
/// With no statement at all the user's own profession is required; once the user
/// has written a statement that does not name a profession, profession is left open.
pub fn default_constraints(
    profile: &UserProfile,
    age_spread: u8,
    statement_given: bool,
) -> ResolvedConstraints {
    let profession = match profile.profession() {
        Some(p) if !statement_given => ProfessionRule::SameAsUser(p.to_string()),
        _ => ProfessionRule::None,
    };

    ResolvedConstraints {
        age: AgeRule::Range {
            around: profile.age,
            spread: age_spread,
        },
        profession,
        location: same_location(profile),
    }
}

fn same_location(profile: &UserProfile) -> LocationRule {
    profile
        .location()
        .map(|l| LocationRule::SameAsUser(l.to_string()))
        .unwrap_or(LocationRule::Any)
}

#[derive(Debug, Clone)]
struct Phrase {
    label: String,
    tokens: Vec<String>,
}

impl Phrase {
    fn new(label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            tokens: tokenize(label),
        }
    }

    /// Match at `start`, letting the last word carry a plural `s`
    fn matches_at(&self, tokens: &[String], start: usize) -> bool {
        let n = self.tokens.len();
        if n == 0 || start + n > tokens.len() {
            return false;
        }
        self.tokens.iter().enumerate().all(|(k, want)| {
            let have = &tokens[start + k];
            have == want || (k + 1 == n && have.strip_suffix('s') == Some(want.as_str()))
        })
    }
}

/// Professions and locations the rule-based parser recognises
#[derive(Debug, Clone)]
pub struct Vocabulary {
    professions: Vec<Phrase>,
    locations: Vec<Phrase>,
}

impl Vocabulary {
    pub fn new<'a, P, L>(professions: P, locations: L) -> Self
    where
        P: IntoIterator<Item = &'a str>,
        L: IntoIterator<Item = &'a str>,
    {
        Self {
            professions: phrases(professions),
            locations: phrases(locations),
        }
    }

    pub fn builtin() -> Self {
        Self::new(KNOWN_PROFESSIONS.iter().copied(), KNOWN_CITIES.iter().copied())
    }

    /// Built-in vocabulary extended with whatever the catalog contains
    pub fn from_catalog(store: &ProfileStore) -> Self {
        let professions = store.professions();
        let locations = store.locations();

        Self::new(
            KNOWN_PROFESSIONS
                .iter()
                .copied()
                .chain(professions.iter().map(String::as_str)),
            KNOWN_CITIES
                .iter()
                .copied()
                .chain(locations.iter().map(String::as_str)),
        )
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn phrases<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<Phrase> {
    let mut out: Vec<Phrase> = Vec::new();
    for label in labels {
        let phrase = Phrase::new(label);
        if !phrase.tokens.is_empty() && !out.iter().any(|p| p.tokens == phrase.tokens) {
            out.push(phrase);
        }
    }
    out
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn word(tokens: &[String], i: usize) -> Option<&str> {
    tokens.get(i).map(String::as_str)
}

fn number(tokens: &[String], i: usize) -> Option<u8> {
    tokens.get(i).and_then(|t| t.parse().ok())
}

fn negated_at(tokens: &[String], i: usize, window: usize) -> bool {
    (1..=window)
        .filter_map(|back| i.checked_sub(back))
        .any(|j| NEGATIONS.contains(&tokens[j].as_str()))
}

enum Resolution<T> {
    Unstated,
    Resolved(T),
    Ambiguous,
}

/// Take the first number after `start`, skipping filler words ("older than 30")
fn take_number(tokens: &[String], start: usize, consumed: &mut [bool]) -> Option<u8> {
    let mut i = start;
    while word(tokens, i).map_or(false, |w| NUMBER_FILLERS.contains(&w)) && i < start + 2 {
        i += 1;
    }
    let n = number(tokens, i)?;
    if consumed[i] {
        return None;
    }
    consumed[i] = true;
    Some(n)
}

/// Two numbers joined by "and"/"to" or adjacent ("25-30" tokenizes as two numbers)
fn take_pair(tokens: &[String], start: usize, consumed: &mut [bool]) -> Option<(u8, u8)> {
    let first = number(tokens, start).filter(|_| !consumed[start])?;
    let second_at = if number(tokens, start + 1).is_some() {
        start + 1
    } else if matches!(word(tokens, start + 1), Some("and" | "to")) {
        start + 2
    } else {
        return None;
    };
    let second = number(tokens, second_at).filter(|_| !consumed[second_at])?;
    consumed[start] = true;
    consumed[second_at] = true;
    Some((first.min(second), first.max(second)))
}

fn refers_to_user(tokens: &[String], start: usize) -> bool {
    let i = if word(tokens, start) == Some("than") { start + 1 } else { start };
    matches!(word(tokens, i), Some("me" | "myself" | "i"))
}

fn parse_age(tokens: &[String], user_age: u8) -> Resolution<AgeRule> {
    let mut signals: Vec<AgeRule> = Vec::new();
    let mut consumed = vec![false; tokens.len()];
    let mut negated = false;

    for i in 0..tokens.len() {
        let previous = i.checked_sub(1).and_then(|p| word(tokens, p));
        let token = tokens[i].as_str();

        let signal = match token {
            "any" if word(tokens, i + 1) == Some("age") => Some(AgeRule::None),
            "same" if word(tokens, i + 1) == Some("age") => Some(AgeRule::Exact { age: user_age }),
            "exactly" | "exact" => {
                take_number(tokens, i + 1, &mut consumed).map(|age| AgeRule::Exact { age })
            }
            "between" => take_pair(tokens, i + 1, &mut consumed)
                .map(|(min, max)| AgeRule::Between { min, max }),
            "older" | "elder" => Some(if refers_to_user(tokens, i + 1) {
                AgeRule::Min { age: user_age.saturating_add(1) }
            } else if let Some(n) = take_number(tokens, i + 1, &mut consumed) {
                AgeRule::Min { age: n.saturating_add(1) }
            } else {
                AgeRule::Min { age: user_age.saturating_add(1) }
            }),
            "younger" => Some(if refers_to_user(tokens, i + 1) {
                AgeRule::Max { age: user_age.saturating_sub(1) }
            } else if let Some(n) = take_number(tokens, i + 1, &mut consumed) {
                AgeRule::Max { age: n.saturating_sub(1) }
            } else {
                AgeRule::Max { age: user_age.saturating_sub(1) }
            }),
            "above" | "over" => take_number(tokens, i + 1, &mut consumed)
                .map(|n| AgeRule::Min { age: n.saturating_add(1) }),
            "below" | "under" => take_number(tokens, i + 1, &mut consumed)
                .map(|n| AgeRule::Max { age: n.saturating_sub(1) }),
            "least" if previous == Some("at") => {
                take_number(tokens, i + 1, &mut consumed).map(|age| AgeRule::Min { age })
            }
            "most" if previous == Some("at") => {
                take_number(tokens, i + 1, &mut consumed).map(|age| AgeRule::Max { age })
            }
            "to" if previous == Some("up") => {
                take_number(tokens, i + 1, &mut consumed).map(|age| AgeRule::Max { age })
            }
            "minimum" | "min" => {
                take_number(tokens, i + 1, &mut consumed).map(|age| AgeRule::Min { age })
            }
            "maximum" | "max" => {
                take_number(tokens, i + 1, &mut consumed).map(|age| AgeRule::Max { age })
            }
            _ => None,
        };

        if let Some(rule) = signal {
            // two-word keywords ("at least", "up to") are negated before their first word
            let lead = if matches!(token, "least" | "most" | "to") { i - 1 } else { i };
            negated |= negated_at(tokens, lead, NEGATION_WINDOW);
            signals.push(rule);
        }
    }

    // Numbers not claimed by a keyword: "25-30", "25 years old", "aged 25"
    for i in 0..tokens.len() {
        if consumed[i] || number(tokens, i).is_none() {
            continue;
        }
        if let Some((min, max)) = take_pair(tokens, i, &mut consumed) {
            signals.push(AgeRule::Between { min, max });
            continue;
        }
        let Some(age) = number(tokens, i) else {
            continue;
        };
        let aged = i
            .checked_sub(1)
            .map_or(false, |p| matches!(tokens[p].as_str(), "aged" | "age"));
        let years = matches!(word(tokens, i + 1), Some("years" | "year" | "yrs" | "yr"));
        let years_old = years && word(tokens, i + 2) == Some("old");
        // "5 years experience" is not an age
        let adult_years = years
            && age >= MIN_ADULT_AGE
            && !matches!(word(tokens, i + 2), Some("experience" | "exp" | "of" | "in"));
        if aged || years_old || adult_years {
            consumed[i] = true;
            signals.push(AgeRule::Exact { age });
        }
    }

    if negated {
        return Resolution::Ambiguous;
    }

    let mut distinct: Vec<AgeRule> = Vec::new();
    for rule in signals {
        if !distinct.contains(&rule) {
            distinct.push(rule);
        }
    }

    match distinct.as_slice() {
        [] => Resolution::Unstated,
        [rule] => Resolution::Resolved(*rule),
        [AgeRule::Min { age: min }, AgeRule::Max { age: max }]
        | [AgeRule::Max { age: max }, AgeRule::Min { age: min }]
            if min <= max =>
        {
            Resolution::Resolved(AgeRule::Between { min: *min, max: *max })
        }
        _ => Resolution::Ambiguous,
    }
}

/// What a statement says about a text dimension
#[derive(Debug, Clone, PartialEq)]
enum TextSignal {
    Any,
    SameAsUser,
    Named(String),
}

/// Scan for "any <noun>", "same/my <noun>" and vocabulary phrases.
fn parse_text_dimension(
    tokens: &[String],
    vocabulary: &[Phrase],
    nouns: &[&str],
    anywhere_word: Option<&str>,
) -> Resolution<TextSignal> {
    let mut signals: Vec<TextSignal> = Vec::new();
    let mut negated = false;

    for i in 0..tokens.len() {
        let token = tokens[i].as_str();
        let next_is_noun = word(tokens, i + 1).map_or(false, |w| nouns.contains(&w));

        if (token == "any" && next_is_noun) || Some(token) == anywhere_word {
            signals.push(TextSignal::Any);
        } else if matches!(token, "same" | "my") && next_is_noun {
            negated |= negated_at(tokens, i, NEGATION_WINDOW);
            signals.push(TextSignal::SameAsUser);
        }
    }

    // (start, len, label) of every vocabulary hit
    let mut hits: Vec<(usize, usize, &str)> = Vec::new();
    for phrase in vocabulary {
        for start in 0..tokens.len() {
            if phrase.matches_at(tokens, start) {
                hits.push((start, phrase.tokens.len(), phrase.label.as_str()));
            }
        }
    }

    // "software engineer" also contains "engineer"; keep only the longest hit
    let longest: Vec<(usize, usize, &str)> = hits
        .iter()
        .copied()
        .filter(|&(start, len, _)| {
            !hits.iter().any(|&(s, l, _)| l > len && s <= start && start + len <= s + l)
        })
        .collect();

    for (start, _, label) in longest {
        negated |= negated_at(tokens, start, NEGATION_WINDOW);
        signals.push(TextSignal::Named(label.to_string()));
    }

    if negated {
        return Resolution::Ambiguous;
    }

    let mut distinct: Vec<TextSignal> = Vec::new();
    for signal in signals {
        let seen = distinct.iter().any(|d| match (d, &signal) {
            (TextSignal::Named(a), TextSignal::Named(b)) => same_text(a, b),
            (a, b) => a == b,
        });
        if !seen {
            distinct.push(signal);
        }
    }

    match distinct.len() {
        0 => Resolution::Unstated,
        1 => Resolution::Resolved(distinct.remove(0)),
        _ => Resolution::Ambiguous,
    }
}

/// Result of the deterministic parse, including what it could not settle
#[derive(Debug, Clone, PartialEq)]
pub struct RuleParse {
    pub constraints: ResolvedConstraints,
    /// Dimensions that fell back to their default because the text was ambiguous
    pub ambiguous: Vec<Dimension>,
    /// The statement mixes clauses ("but", "or", ...) the rules may have misread
    pub mixed_clauses: bool,
}

impl RuleParse {
    pub fn needs_delegation(&self) -> bool {
        !self.ambiguous.is_empty() || self.mixed_clauses
    }
}

fn settle<T>(resolution: Resolution<T>, default: T, dimension: Dimension, ambiguous: &mut Vec<Dimension>) -> T {
    match resolution {
        Resolution::Unstated => default,
        Resolution::Resolved(value) => value,
        Resolution::Ambiguous => {
            ambiguous.push(dimension);
            default
        }
    }
}

/// Deterministic phrase-rule interpreter
#[derive(Debug, Clone)]
pub struct RuleBasedInterpreter {
    vocabulary: Vocabulary,
    age_spread: u8,
}

impl RuleBasedInterpreter {
    pub fn new(vocabulary: Vocabulary, age_spread: u8) -> Self {
        Self {
            vocabulary,
            age_spread,
        }
    }

    pub fn parse(&self, statement: &str, profile: &UserProfile) -> RuleParse {
        let tokens = tokenize(statement);
        let defaults = default_constraints(profile, self.age_spread, !tokens.is_empty());
        let mut ambiguous = Vec::new();

        let age = settle(parse_age(&tokens, profile.age), defaults.age, Dimension::Age, &mut ambiguous);

        let profession = match parse_text_dimension(
            &tokens,
            &self.vocabulary.professions,
            &["profession", "job", "field", "occupation", "career", "work"],
            None,
        ) {
            Resolution::Resolved(TextSignal::Any) => Resolution::Resolved(ProfessionRule::None),
            Resolution::Resolved(TextSignal::Named(p)) => Resolution::Resolved(ProfessionRule::Exact(p)),
            Resolution::Resolved(TextSignal::SameAsUser) => match profile.profession() {
                Some(p) => Resolution::Resolved(ProfessionRule::SameAsUser(p.to_string())),
                None => Resolution::Ambiguous,
            },
            Resolution::Unstated => Resolution::Unstated,
            Resolution::Ambiguous => Resolution::Ambiguous,
        };
        let profession = settle(profession, defaults.profession, Dimension::Profession, &mut ambiguous);

        let location = match parse_text_dimension(
            &tokens,
            &self.vocabulary.locations,
            &["location", "city", "place", "where"],
            Some("anywhere"),
        ) {
            Resolution::Resolved(TextSignal::Any) => Resolution::Resolved(LocationRule::Any),
            Resolution::Resolved(TextSignal::Named(l)) => Resolution::Resolved(LocationRule::Exact(l)),
            Resolution::Resolved(TextSignal::SameAsUser) => Resolution::Resolved(same_location(profile)),
            Resolution::Unstated => Resolution::Unstated,
            Resolution::Ambiguous => Resolution::Ambiguous,
        };
        let location = settle(location, defaults.location, Dimension::Location, &mut ambiguous);

        let mixed_clauses = tokens
            .iter()
            .any(|t| MIXED_CLAUSE_MARKERS.contains(&t.as_str()));

        RuleParse {
            constraints: ResolvedConstraints {
                age,
                profession,
                location,
            },
            ambiguous,
            mixed_clauses,
        }
    }
}

impl Default for RuleBasedInterpreter {
    fn default() -> Self {
        Self::new(Vocabulary::builtin(), DEFAULT_AGE_SPREAD)
    }
}

#[async_trait]
impl PreferenceInterpreter for RuleBasedInterpreter {
    async fn interpret(&self, statement: &str, profile: &UserProfile) -> ResolvedConstraints {
        let parse = self.parse(statement, profile);
        if !parse.ambiguous.is_empty() {
            tracing::debug!("Ambiguous preference dimensions {:?}, using defaults", parse.ambiguous);
        }
        parse.constraints
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
enum AgeAnswer {
    Exact { age: u8 },
    Min { age: u8 },
    Max { age: u8 },
    Between { min: u8, max: u8 },
    Range { spread: u8 },
    None,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
enum ProfessionAnswer {
    Exact { value: String },
    SameAsUser,
    None,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
enum LocationAnswer {
    Exact { value: String },
    SameAsUser,
    Any,
}

fn decode<T: serde::de::DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Replace each dimension of `fallback` with the delegated answer when that
/// answer is well formed.
pub fn merge_delegated(
    answer: DelegatedConstraints,
    fallback: ResolvedConstraints,
    profile: &UserProfile,
) -> ResolvedConstraints {
    let age = decode::<AgeAnswer>(answer.age).and_then(|a| match a {
        AgeAnswer::Exact { age } => Some(AgeRule::Exact { age }),
        AgeAnswer::Min { age } => Some(AgeRule::Min { age }),
        AgeAnswer::Max { age } => Some(AgeRule::Max { age }),
        AgeAnswer::Between { min, max } if min <= max => Some(AgeRule::Between { min, max }),
        AgeAnswer::Between { .. } => None,
        AgeAnswer::Range { spread } => Some(AgeRule::Range { around: profile.age, spread }),
        AgeAnswer::None => Some(AgeRule::None),
    });

    let profession = decode::<ProfessionAnswer>(answer.profession).and_then(|p| match p {
        ProfessionAnswer::Exact { value } => non_empty(value).map(ProfessionRule::Exact),
        ProfessionAnswer::SameAsUser => profile
            .profession()
            .map(|p| ProfessionRule::SameAsUser(p.to_string())),
        ProfessionAnswer::None => Some(ProfessionRule::None),
    });

    let location = decode::<LocationAnswer>(answer.location).and_then(|l| match l {
        LocationAnswer::Exact { value } => non_empty(value).map(LocationRule::Exact),
        LocationAnswer::SameAsUser => Some(same_location(profile)),
        LocationAnswer::Any => Some(LocationRule::Any),
    });

    ResolvedConstraints {
        age: age.unwrap_or(fallback.age),
        profession: profession.unwrap_or(fallback.profession),
        location: location.unwrap_or(fallback.location),
    }
}

/// Rule-based interpreter that hands complex statements to the reasoning component.
///
/// At most one delegation per call, bounded by `timeout`. A failed or timed-out
/// delegation keeps the rule-based result.
pub struct DelegatingInterpreter {
    rules: RuleBasedInterpreter,
    reasoning: Arc<dyn ReasoningClient>,
    timeout: Duration,
}

impl DelegatingInterpreter {
    pub fn new(rules: RuleBasedInterpreter, reasoning: Arc<dyn ReasoningClient>, timeout: Duration) -> Self {
        Self {
            rules,
            reasoning,
            timeout,
        }
    }
}

#[async_trait]
impl PreferenceInterpreter for DelegatingInterpreter {
    async fn interpret(&self, statement: &str, profile: &UserProfile) -> ResolvedConstraints {
        let parse = self.rules.parse(statement, profile);
        if !parse.needs_delegation() {
            return parse.constraints;
        }

        tracing::info!(
            "Delegating preference interpretation (ambiguous: {:?}, mixed clauses: {})",
            parse.ambiguous,
            parse.mixed_clauses
        );

        let call = self.reasoning.extract_constraints(statement, profile);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(answer)) => merge_delegated(answer, parse.constraints, profile),
            Ok(Err(e)) => {
                tracing::warn!("Preference delegation failed, keeping rule-based constraints: {}", e);
                parse.constraints
            }
            Err(_) => {
                tracing::warn!(
                    "Preference delegation timed out after {:?}, keeping rule-based constraints",
                    self.timeout
                );
                parse.constraints
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateProfile, Gender};
    use crate::services::ReasoningError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user(statement: &str) -> UserProfile {
        UserProfile {
            name: "Ali".to_string(),
            age: 28,
            gender: Gender::Male,
            profession: Some("Engineer".to_string()),
            education: Some("BSCS".to_string()),
            location: Some("Lahore".to_string()),
            contact_number: "923121234567".to_string(),
            preference: Some(statement.to_string()),
        }
    }

    fn parse(statement: &str) -> RuleParse {
        RuleBasedInterpreter::default().parse(statement, &user(statement))
    }

    #[test]
    fn test_empty_statement_uses_defaults() {
        let result = parse("");

        assert_eq!(
            result.constraints,
            ResolvedConstraints {
                age: AgeRule::Range { around: 28, spread: 3 },
                profession: ProfessionRule::SameAsUser("Engineer".into()),
                location: LocationRule::SameAsUser("Lahore".into()),
            }
        );
        assert!(!result.needs_delegation());
    }

    #[test]
    fn test_defaults_without_user_profession_or_location() {
        let mut profile = user("");
        profile.profession = None;
        profile.location = None;

        let constraints = RuleBasedInterpreter::default().parse("", &profile).constraints;

        assert_eq!(constraints.profession, ProfessionRule::None);
        assert_eq!(constraints.location, LocationRule::Any);
    }

    #[test]
    fn test_older_than_me_from_city() {
        let result = parse("older than me, from Lahore");

        assert_eq!(result.constraints.age, AgeRule::Min { age: 29 });
        assert_eq!(result.constraints.location, LocationRule::Exact("Lahore".into()));
        assert_eq!(result.constraints.profession, ProfessionRule::None);
        assert!(result.ambiguous.is_empty());
    }

    #[test]
    fn test_any_location() {
        let result = parse("any location is fine");
        assert_eq!(result.constraints.location, LocationRule::Any);

        let result = parse("she can be from anywhere");
        assert_eq!(result.constraints.location, LocationRule::Any);
    }

    #[test]
    fn test_age_phrases() {
        assert_eq!(parse("exactly 25").constraints.age, AgeRule::Exact { age: 25 });
        assert_eq!(parse("someone 26 years old").constraints.age, AgeRule::Exact { age: 26 });
        assert_eq!(parse("younger than me").constraints.age, AgeRule::Max { age: 27 });
        assert_eq!(parse("younger").constraints.age, AgeRule::Max { age: 27 });
        assert_eq!(parse("older than 30").constraints.age, AgeRule::Min { age: 31 });
        assert_eq!(parse("at least 25").constraints.age, AgeRule::Min { age: 25 });
        assert_eq!(parse("up to 30").constraints.age, AgeRule::Max { age: 30 });
        assert_eq!(parse("between 24 and 27").constraints.age, AgeRule::Between { min: 24, max: 27 });
        assert_eq!(parse("aged 24-27").constraints.age, AgeRule::Between { min: 24, max: 27 });
        assert_eq!(parse("same age as me").constraints.age, AgeRule::Exact { age: 28 });
        assert_eq!(parse("any age").constraints.age, AgeRule::None);
    }

    #[test]
    fn test_min_and_max_combine() {
        let result = parse("at least 25 and at most 29");
        assert_eq!(result.constraints.age, AgeRule::Between { min: 25, max: 29 });
    }

    #[test]
    fn test_conflicting_age_falls_back() {
        let result = parse("older than me and younger than me");

        assert_eq!(result.constraints.age, AgeRule::Range { around: 28, spread: 3 });
        assert_eq!(result.ambiguous, vec![Dimension::Age]);
    }

    #[test]
    fn test_longest_profession_wins() {
        let result = parse("a software engineer");
        assert_eq!(result.constraints.profession, ProfessionRule::Exact("Software Engineer".into()));

        let result = parse("looking for doctors");
        assert_eq!(result.constraints.profession, ProfessionRule::Exact("Doctor".into()));
    }

    #[test]
    fn test_two_professions_are_ambiguous() {
        let result = parse("a doctor, teacher");

        assert_eq!(result.constraints.profession, ProfessionRule::None);
        assert_eq!(result.ambiguous, vec![Dimension::Profession]);
        assert!(result.needs_delegation());
    }

    #[test]
    fn test_negated_location_is_ambiguous() {
        let result = parse("not from Karachi");

        assert_eq!(result.constraints.location, LocationRule::SameAsUser("Lahore".into()));
        assert_eq!(result.ambiguous, vec![Dimension::Location]);
    }

    #[test]
    fn test_negated_own_city_is_ambiguous() {
        let result = parse("not from my city");

        assert_eq!(result.ambiguous, vec![Dimension::Location]);
        assert!(result.needs_delegation());
    }

    #[test]
    fn test_negated_same_profession_is_ambiguous() {
        let result = parse("not the same profession as me");

        assert_eq!(result.constraints.profession, ProfessionRule::None);
        assert_eq!(result.ambiguous, vec![Dimension::Profession]);
    }

    #[test]
    fn test_negated_age_bound_is_ambiguous() {
        let result = parse("no one older than 30");

        assert_eq!(result.constraints.age, AgeRule::Range { around: 28, spread: 3 });
        assert_eq!(result.ambiguous, vec![Dimension::Age]);
    }

    #[test]
    fn test_years_of_experience_is_not_an_age() {
        let result = parse("a doctor with 5 years experience");

        assert_eq!(result.constraints.age, AgeRule::Range { around: 28, spread: 3 });
        assert_eq!(result.constraints.profession, ProfessionRule::Exact("Doctor".into()));
        assert!(result.ambiguous.is_empty());

        let result = parse("a doctor with 20 years of experience");
        assert_eq!(result.constraints.age, AgeRule::Range { around: 28, spread: 3 });
    }

    #[test]
    fn test_bare_adult_years_is_an_age() {
        assert_eq!(parse("someone 27 years").constraints.age, AgeRule::Exact { age: 27 });
    }

    #[test]
    fn test_same_profession_and_city() {
        let result = parse("same profession, my city");

        assert_eq!(result.constraints.profession, ProfessionRule::SameAsUser("Engineer".into()));
        assert_eq!(result.constraints.location, LocationRule::SameAsUser("Lahore".into()));
    }

    #[test]
    fn test_mixed_clauses_flagged() {
        assert!(parse("a doctor but from Karachi").mixed_clauses);
        assert!(!parse("a doctor from Karachi").mixed_clauses);
    }

    #[test]
    fn test_catalog_vocabulary() {
        let store = ProfileStore::new(vec![CandidateProfile {
            name: "Sana".into(),
            age: 27,
            gender: Gender::Female,
            profession: Some("Fashion Designer".into()),
            education: None,
            location: Some("Multan".into()),
        }]);
        let interpreter = RuleBasedInterpreter::new(Vocabulary::from_catalog(&store), DEFAULT_AGE_SPREAD);

        let result = interpreter.parse("a fashion designer from multan", &user(""));

        assert_eq!(result.constraints.profession, ProfessionRule::Exact("Fashion Designer".into()));
        assert_eq!(result.constraints.location, LocationRule::Exact("Multan".into()));
    }

    struct FakeReasoning {
        answer: Option<Value>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeReasoning {
        fn answering(answer: Value) -> Self {
            Self { answer: Some(answer), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { answer: None, delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ReasoningClient for FakeReasoning {
        async fn extract_constraints(
            &self,
            _statement: &str,
            _profile: &UserProfile,
        ) -> Result<DelegatedConstraints, ReasoningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.answer {
                Some(v) => Ok(serde_json::from_value(v.clone()).unwrap()),
                None => Err(ReasoningError::ApiError("503 Service Unavailable".into())),
            }
        }

        async fn explain_match(
            &self,
            _user: &UserProfile,
            _candidate: &CandidateProfile,
            _constraints: &ResolvedConstraints,
            draft: &str,
        ) -> Result<String, ReasoningError> {
            Ok(draft.to_string())
        }
    }

    fn delegating(fake: Arc<FakeReasoning>, timeout: Duration) -> DelegatingInterpreter {
        DelegatingInterpreter::new(RuleBasedInterpreter::default(), fake, timeout)
    }

    #[tokio::test]
    async fn test_simple_statement_is_not_delegated() {
        let fake = Arc::new(FakeReasoning::answering(json!({})));
        let interpreter = delegating(fake.clone(), Duration::from_secs(1));

        let constraints = interpreter.interpret("older than me", &user("older than me")).await;

        assert_eq!(constraints.age, AgeRule::Min { age: 29 });
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delegated_answer_replaces_dimensions() {
        let fake = Arc::new(FakeReasoning::answering(json!({
            "profession": {"rule": "exact", "value": "Teacher"},
            "location": {"rule": "any"},
            "age": {"rule": "between", "min": 30, "max": 20}
        })));
        let interpreter = delegating(fake.clone(), Duration::from_secs(1));
        let statement = "a doctor or a teacher, but location does not matter";

        let constraints = interpreter.interpret(statement, &user(statement)).await;

        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(constraints.profession, ProfessionRule::Exact("Teacher".into()));
        assert_eq!(constraints.location, LocationRule::Any);
        // malformed range keeps the rule-based default
        assert_eq!(constraints.age, AgeRule::Range { around: 28, spread: 3 });
    }

    #[tokio::test]
    async fn test_failed_delegation_keeps_rules() {
        let fake = Arc::new(FakeReasoning::failing());
        let interpreter = delegating(fake.clone(), Duration::from_secs(1));
        let statement = "older than me but from Karachi";

        let constraints = interpreter.interpret(statement, &user(statement)).await;

        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(constraints.age, AgeRule::Min { age: 29 });
        assert_eq!(constraints.location, LocationRule::Exact("Karachi".into()));
    }

    #[tokio::test]
    async fn test_delegation_timeout_keeps_rules() {
        let fake = Arc::new(FakeReasoning {
            answer: Some(json!({"location": {"rule": "any"}})),
            delay: Duration::from_secs(5),
            calls: AtomicUsize::new(0),
        });
        let interpreter = delegating(fake, Duration::from_millis(20));
        let statement = "from Karachi or Lahore";

        let constraints = interpreter.interpret(statement, &user(statement)).await;

        assert_eq!(constraints.location, LocationRule::SameAsUser("Lahore".into()));
    }
}
