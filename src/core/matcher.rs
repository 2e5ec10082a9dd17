use serde::Deserialize;

use crate::core::{
    filters::satisfies_all,
    scoring::{compatibility_score, SelectionPenalties},
};
use crate::models::{CandidateProfile, ResolvedConstraints, UserProfile};

/// How to choose between several candidates that pass every rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First surviving candidate in catalog order
    CatalogOrder,
    /// Lowest compatibility score, catalog order among equal scores
    #[default]
    Score,
}

/// Selector - picks at most one candidate under the resolved constraints
///
/// Every active rule is a hard filter. The selection is a pure function of its
/// inputs, so running it twice on the same data yields the same candidate.
#[derive(Debug, Clone)]
pub struct Matcher {
    penalties: SelectionPenalties,
    tie_break: TieBreak,
}

impl Matcher {
    pub fn new(penalties: SelectionPenalties, tie_break: TieBreak) -> Self {
        Self { penalties, tie_break }
    }

    pub fn with_defaults() -> Self {
        Self::new(SelectionPenalties::default(), TieBreak::default())
    }

    /// Select the best candidate from the eligible set
    ///
    /// # Arguments
    /// * `eligible` - Candidates that passed the pre-filter, in catalog order
    /// * `constraints` - Resolved preference rules
    /// * `user` - The requesting user, used only for the compatibility score
    ///
    /// # Returns
    /// The chosen candidate, or `None` when nothing satisfies every rule
    pub fn select<'a>(
        &self,
        eligible: &[&'a CandidateProfile],
        constraints: &ResolvedConstraints,
        user: &UserProfile,
    ) -> Option<&'a CandidateProfile> {
        let mut passing = eligible
            .iter()
            .copied()
            .filter(|candidate| satisfies_all(candidate, constraints));

        match self.tie_break {
            TieBreak::CatalogOrder => passing.next(),
            // min_by_key keeps the first of equally scored candidates
            TieBreak::Score => {
                passing.min_by_key(|candidate| compatibility_score(candidate, user, &self.penalties))
            }
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeRule, Gender, LocationRule, ProfessionRule};

    fn create_candidate(name: &str, age: u8, profession: &str, location: &str) -> CandidateProfile {
        CandidateProfile {
            name: name.to_string(),
            age,
            gender: Gender::Female,
            profession: Some(profession.to_string()),
            education: Some("BSCS".to_string()),
            location: Some(location.to_string()),
        }
    }

    fn create_user() -> UserProfile {
        UserProfile {
            name: "Ali".to_string(),
            age: 28,
            gender: Gender::Male,
            profession: Some("Engineer".to_string()),
            education: Some("BSCS".to_string()),
            location: Some("Lahore".to_string()),
            contact_number: "923121234567".to_string(),
            preference: None,
        }
    }

    fn open_constraints() -> ResolvedConstraints {
        ResolvedConstraints {
            age: AgeRule::None,
            profession: ProfessionRule::None,
            location: LocationRule::Any,
        }
    }

    #[test]
    fn test_hard_filter_rejects_violations() {
        let catalog = vec![
            create_candidate("Sana", 27, "Doctor", "Karachi"),
            create_candidate("Hira", 30, "Doctor", "Lahore"),
        ];
        let eligible: Vec<_> = catalog.iter().collect();
        let constraints = ResolvedConstraints {
            age: AgeRule::Min { age: 29 },
            location: LocationRule::Exact("Lahore".into()),
            ..open_constraints()
        };

        let selected = Matcher::default().select(&eligible, &constraints, &create_user());

        assert_eq!(selected.map(|c| c.name.as_str()), Some("Hira"));
    }

    #[test]
    fn test_none_when_nothing_passes() {
        let catalog = vec![create_candidate("Sana", 27, "Doctor", "Karachi")];
        let eligible: Vec<_> = catalog.iter().collect();
        let constraints = ResolvedConstraints {
            profession: ProfessionRule::Exact("Teacher".into()),
            ..open_constraints()
        };

        assert!(Matcher::default().select(&eligible, &constraints, &create_user()).is_none());
    }

    #[test]
    fn test_score_prefers_closest_candidate() {
        let catalog = vec![
            create_candidate("Sana", 25, "Doctor", "Lahore"),
            create_candidate("Hira", 27, "Engineer", "Lahore"),
        ];
        let eligible: Vec<_> = catalog.iter().collect();

        let selected = Matcher::default().select(&eligible, &open_constraints(), &create_user());

        assert_eq!(selected.map(|c| c.name.as_str()), Some("Hira"));
    }

    #[test]
    fn test_catalog_order_tie_break() {
        let catalog = vec![
            create_candidate("Sana", 25, "Doctor", "Lahore"),
            create_candidate("Hira", 27, "Engineer", "Lahore"),
        ];
        let eligible: Vec<_> = catalog.iter().collect();
        let matcher = Matcher::new(SelectionPenalties::default(), TieBreak::CatalogOrder);

        let selected = matcher.select(&eligible, &open_constraints(), &create_user());

        assert_eq!(selected.map(|c| c.name.as_str()), Some("Sana"));
    }

    #[test]
    fn test_equal_scores_keep_catalog_order() {
        let catalog = vec![
            create_candidate("Sana", 27, "Engineer", "Lahore"),
            create_candidate("Hira", 29, "Engineer", "Lahore"),
        ];
        let eligible: Vec<_> = catalog.iter().collect();

        let selected = Matcher::default().select(&eligible, &open_constraints(), &create_user());

        assert_eq!(selected.map(|c| c.name.as_str()), Some("Sana"));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let catalog: Vec<_> = (0..20)
            .map(|i| create_candidate(&format!("C{}", i), 24 + (i % 8) as u8, "Doctor", "Lahore"))
            .collect();
        let eligible: Vec<_> = catalog.iter().collect();
        let matcher = Matcher::default();

        let first = matcher.select(&eligible, &open_constraints(), &create_user());
        let second = matcher.select(&eligible, &open_constraints(), &create_user());

        assert_eq!(first, second);
    }
}
