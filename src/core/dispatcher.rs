use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    AgeRule, CandidateProfile, DispatchStatus, LocationRule, ProfessionRule, ResolvedConstraints,
    UserProfile,
};
use crate::services::{destination_for, DeliveryReceipt, Notifier, NotifyError};

/// Failure of an outbound call made by the engine
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },
}

/// What happened in the dispatch stage of one request
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub status: DispatchStatus,
    /// Message body that was handed to the notifier
    pub body: Option<String>,
    pub receipt: Option<DeliveryReceipt>,
    pub error: Option<String>,
}

impl DispatchReport {
    fn skipped() -> Self {
        Self {
            status: DispatchStatus::Skipped,
            body: None,
            receipt: None,
            error: None,
        }
    }
}

/// One-sentence justification built from the rules the candidate satisfied
pub fn justify(candidate: &CandidateProfile, constraints: &ResolvedConstraints) -> String {
    let mut clauses = Vec::new();

    match constraints.age {
        AgeRule::Exact { age } => clauses.push(format!("exactly {} years old as you asked", age)),
        AgeRule::Min { age } => clauses.push(format!(
            "{} years old, meeting your minimum age of {}",
            candidate.age, age
        )),
        AgeRule::Max { age } => clauses.push(format!(
            "{} years old, within your maximum age of {}",
            candidate.age, age
        )),
        AgeRule::Between { min, max } => clauses.push(format!(
            "{} years old, inside your {}-{} age range",
            candidate.age, min, max
        )),
        AgeRule::Range { spread, .. } => clauses.push(format!(
            "{} years old, within {} years of your age",
            candidate.age, spread
        )),
        AgeRule::None => {}
    }

    let profession = candidate.profession().unwrap_or("professional");
    let article = indefinite_article(profession);
    match &constraints.profession {
        ProfessionRule::Exact(_) => {
            clauses.push(format!("{} {} as you requested", article, profession))
        }
        ProfessionRule::SameAsUser(_) => clauses.push(format!("{} {} like you", article, profession)),
        ProfessionRule::None => {}
    }

    let location = candidate.location().unwrap_or("an unlisted city");
    match &constraints.location {
        LocationRule::Exact(_) => clauses.push(format!("from {} as you requested", location)),
        LocationRule::SameAsUser(_) => clauses.push(format!("from {}, your own city", location)),
        LocationRule::Any => {}
    }

    if clauses.is_empty() {
        return format!(
            "This match was chosen because {} is the most compatible profile available.",
            candidate.name
        );
    }

    let joined = match clauses.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        _ => clauses.join(""),
    };

    format!("This match was chosen because {} is {}.", candidate.name, joined)
}

/// "an" before a vowel letter ("an AI Engineer"), "a" otherwise
fn indefinite_article(noun: &str) -> &'static str {
    match noun.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// WhatsApp message body with both profiles and the justification
pub fn compose_message(user: &UserProfile, candidate: &CandidateProfile, justification: &str) -> String {
    format!(
        "Rishta Bot found a match for you!\n\n\
         Your details:\n\
         Name: {}\nAge: {}\nGender: {}\nProfession: {}\nEducation: {}\nLocation: {}\n\n\
         Match details:\n\
         Name: {}\nAge: {}\nProfession: {}\nEducation: {}\nLocation: {}\n\n\
         {}",
        user.name,
        user.age,
        user.gender,
        or_dash(user.profession()),
        or_dash(user.education()),
        or_dash(user.location()),
        candidate.name,
        candidate.age,
        or_dash(candidate.profession()),
        or_dash(candidate.education()),
        or_dash(candidate.location()),
        justification
    )
}

/// Notification Dispatcher - sends at most one message per selection
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    country_code: String,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, country_code: String, timeout: Duration) -> Self {
        Self {
            notifier,
            country_code,
            timeout,
        }
    }

    /// Send the match to the user's WhatsApp number.
    ///
    /// Without a selected candidate nothing is sent and the report is `Skipped`.
    /// Transport failures are reported, never raised.
    pub async fn dispatch(
        &self,
        user: &UserProfile,
        selected: Option<&CandidateProfile>,
        justification: &str,
    ) -> DispatchReport {
        let Some(candidate) = selected else {
            return DispatchReport::skipped();
        };

        let body = compose_message(user, candidate, justification);
        let destination = destination_for(&user.contact_number, &self.country_code);

        match self.send_bounded(&destination, &body).await {
            Ok(receipt) => {
                tracing::info!(
                    "WhatsApp message delivered (id: {:?}, status: {})",
                    receipt.message_id,
                    receipt.status
                );
                DispatchReport {
                    status: DispatchStatus::Sent,
                    body: Some(body),
                    receipt: Some(receipt),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("WhatsApp dispatch failed: {}", e);
                DispatchReport {
                    status: DispatchStatus::Failed,
                    body: Some(body),
                    receipt: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn send_bounded(&self, destination: &str, body: &str) -> Result<DeliveryReceipt, TransportError> {
        tokio::time::timeout(self.timeout, self.notifier.send(destination, body))
            .await
            .map_err(|_| TransportError::Timeout {
                stage: "notification send",
                after: self.timeout,
            })?
            .map_err(TransportError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn candidate() -> CandidateProfile {
        CandidateProfile {
            name: "Hira".to_string(),
            age: 30,
            gender: Gender::Female,
            profession: Some("Doctor".to_string()),
            education: Some("MBBS".to_string()),
            location: Some("Lahore".to_string()),
        }
    }

    fn user() -> UserProfile {
        UserProfile {
            name: "Ali".to_string(),
            age: 28,
            gender: Gender::Male,
            profession: Some("Engineer".to_string()),
            education: None,
            location: Some("Lahore".to_string()),
            contact_number: "923121234567".to_string(),
            preference: None,
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, destination: &str, body: &str) -> Result<DeliveryReceipt, NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), body.to_string()));
            if self.fail {
                return Err(NotifyError::Rejected("instance not authorized".into()));
            }
            Ok(DeliveryReceipt {
                message_id: Some("1".into()),
                status: "ok".into(),
            })
        }
    }

    #[test]
    fn test_justify_mentions_satisfied_rules() {
        let constraints = ResolvedConstraints {
            age: AgeRule::Min { age: 29 },
            profession: ProfessionRule::None,
            location: LocationRule::Exact("Lahore".into()),
        };

        let text = justify(&candidate(), &constraints);

        assert_eq!(
            text,
            "This match was chosen because Hira is 30 years old, meeting your minimum age of 29 \
             and from Lahore as you requested."
        );
    }

    #[test]
    fn test_justify_picks_article_for_profession() {
        let mut engineer = candidate();
        engineer.profession = Some("AI Engineer".into());
        let constraints = ResolvedConstraints {
            age: AgeRule::None,
            profession: ProfessionRule::Exact("AI Engineer".into()),
            location: LocationRule::Any,
        };

        assert_eq!(
            justify(&engineer, &constraints),
            "This match was chosen because Hira is an AI Engineer as you requested."
        );

        let same = ResolvedConstraints {
            profession: ProfessionRule::SameAsUser("Doctor".into()),
            ..constraints
        };
        assert!(justify(&candidate(), &same).contains("is a Doctor like you"));
    }

    #[test]
    fn test_justify_without_active_rules() {
        let constraints = ResolvedConstraints {
            age: AgeRule::None,
            profession: ProfessionRule::None,
            location: LocationRule::Any,
        };

        assert!(justify(&candidate(), &constraints).contains("most compatible profile"));
    }

    #[test]
    fn test_compose_message_contains_both_profiles() {
        let body = compose_message(&user(), &candidate(), "This match was chosen because ...");

        assert!(body.contains("Name: Ali"));
        assert!(body.contains("Education: -"));
        assert!(body.contains("Name: Hira"));
        assert!(body.contains("Profession: Doctor"));
        assert!(body.ends_with("This match was chosen because ..."));
    }

    #[tokio::test]
    async fn test_no_selection_skips_send() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new(notifier.clone(), "92".into(), Duration::from_secs(1));

        let report = dispatcher.dispatch(&user(), None, "").await;

        assert_eq!(report.status, DispatchStatus::Skipped);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_selection_sends_once() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new(notifier.clone(), "92".into(), Duration::from_secs(1));
        let hira = candidate();

        let report = dispatcher.dispatch(&user(), Some(&hira), "because").await;

        assert_eq!(report.status, DispatchStatus::Sent);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+923121234567");
        assert_eq!(Some(&sent[0].1), report.body.as_ref());
    }

    #[tokio::test]
    async fn test_transport_failure_reported() {
        let notifier = Arc::new(RecordingNotifier { fail: true, ..Default::default() });
        let dispatcher = Dispatcher::new(notifier, "92".into(), Duration::from_secs(1));
        let hira = candidate();

        let report = dispatcher.dispatch(&user(), Some(&hira), "because").await;

        assert_eq!(report.status, DispatchStatus::Failed);
        assert!(report.error.unwrap().contains("instance not authorized"));
    }
}
