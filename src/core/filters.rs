use crate::models::{
    same_text, AgeRule, CandidateProfile, LocationRule, ProfessionRule, ResolvedConstraints,
    UserProfile,
};

/// Default width of the coarse age band applied before interpretation
pub const DEFAULT_AGE_BAND: u8 = 4;

/// Hard constraints applied to the whole catalog before any preference is read.
#[derive(Debug, Clone, Copy)]
pub struct PreFilterOptions {
    /// Keep candidates with `|candidate.age - user.age| <= band`; `None` disables the band
    pub age_band: Option<u8>,
    /// Require the user's location when no preference statement was supplied
    pub location_when_unstated: bool,
}

impl Default for PreFilterOptions {
    fn default() -> Self {
        Self {
            age_band: Some(DEFAULT_AGE_BAND),
            location_when_unstated: false,
        }
    }
}

/// Output of the pre-filter. An empty catalog slice is reported as `Empty`,
/// which is a normal outcome rather than an error.
#[derive(Debug, PartialEq)]
pub enum Eligible<'a> {
    Candidates(Vec<&'a CandidateProfile>),
    Empty,
}

impl<'a> Eligible<'a> {
    fn from_vec(candidates: Vec<&'a CandidateProfile>) -> Self {
        if candidates.is_empty() {
            Eligible::Empty
        } else {
            Eligible::Candidates(candidates)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Eligible::Candidates(c) => c.len(),
            Eligible::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Eligible::Empty)
    }

    pub fn as_slice(&self) -> &[&'a CandidateProfile] {
        match self {
            Eligible::Candidates(c) => c,
            Eligible::Empty => &[],
        }
    }
}

/// Stage 1: reduce the catalog with gender, the coarse age band and optionally location.
pub fn prefilter<'a, I>(
    candidates: I,
    user: &UserProfile,
    options: &PreFilterOptions,
) -> Eligible<'a>
where
    I: IntoIterator<Item = &'a CandidateProfile>,
{
    let wanted_gender = user.gender.opposite();
    let required_location = if options.location_when_unstated && user.preference_statement().is_none() {
        user.location()
    } else {
        None
    };

    let eligible = candidates
        .into_iter()
        .filter(|c| c.gender == wanted_gender)
        .filter(|c| match options.age_band {
            Some(band) => c.age.abs_diff(user.age) <= band,
            None => true,
        })
        .filter(|c| match required_location {
            Some(loc) => c.location().map_or(false, |l| same_text(l, loc)),
            None => true,
        })
        .collect();

    Eligible::from_vec(eligible)
}

#[inline]
pub fn satisfies_age(age: u8, rule: &AgeRule) -> bool {
    match *rule {
        AgeRule::Exact { age: wanted } => age == wanted,
        AgeRule::Min { age: min } => age >= min,
        AgeRule::Max { age: max } => age <= max,
        AgeRule::Between { min, max } => age >= min && age <= max,
        AgeRule::Range { around, spread } => age.abs_diff(around) <= spread,
        AgeRule::None => true,
    }
}

#[inline]
pub fn satisfies_profession(profession: Option<&str>, rule: &ProfessionRule) -> bool {
    match rule {
        ProfessionRule::Exact(p) | ProfessionRule::SameAsUser(p) => {
            profession.map_or(false, |have| same_text(have, p))
        }
        ProfessionRule::None => true,
    }
}

#[inline]
pub fn satisfies_location(location: Option<&str>, rule: &LocationRule) -> bool {
    match rule {
        LocationRule::Exact(l) | LocationRule::SameAsUser(l) => {
            location.map_or(false, |have| same_text(have, l))
        }
        LocationRule::Any => true,
    }
}

/// True when the candidate passes every active rule
#[inline]
pub fn satisfies_all(candidate: &CandidateProfile, constraints: &ResolvedConstraints) -> bool {
    satisfies_age(candidate.age, &constraints.age)
        && satisfies_profession(candidate.profession(), &constraints.profession)
        && satisfies_location(candidate.location(), &constraints.location)
}
