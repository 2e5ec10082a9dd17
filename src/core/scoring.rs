use crate::models::{same_text, CandidateProfile, UserProfile};

/// Penalties added to the compatibility score for each mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPenalties {
    pub profession_mismatch: u32,
    pub education_mismatch: u32,
}

impl Default for SelectionPenalties {
    fn default() -> Self {
        Self {
            profession_mismatch: 2,
            education_mismatch: 1,
        }
    }
}

/// Calculate the compatibility score of a candidate; lower is better.
///
/// score = |age difference| + profession penalty + education penalty
///
/// A penalty only applies when the user supplied the field and the candidate's
/// value differs (or is missing).
pub fn compatibility_score(
    candidate: &CandidateProfile,
    user: &UserProfile,
    penalties: &SelectionPenalties,
) -> u32 {
    let age_diff = u32::from(candidate.age.abs_diff(user.age));

    age_diff
        + mismatch_penalty(user.profession(), candidate.profession(), penalties.profession_mismatch)
        + mismatch_penalty(user.education(), candidate.education(), penalties.education_mismatch)
}

#[inline]
fn mismatch_penalty(wanted: Option<&str>, have: Option<&str>, penalty: u32) -> u32 {
    match (wanted, have) {
        (Some(w), Some(h)) if same_text(w, h) => 0,
        (Some(_), _) => penalty,
        (None, _) => 0,
    }
}
