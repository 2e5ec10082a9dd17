use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::models::CandidateProfile;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only rishta catalog shared by every request.
///
/// Cloning is cheap; all clones point at the same profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles: Arc<[CandidateProfile]>,
}

impl ProfileStore {
    pub fn new(profiles: Vec<CandidateProfile>) -> Self {
        Self {
            profiles: profiles.into(),
        }
    }

    /// Load a JSON array of profiles
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        let profiles: Vec<CandidateProfile> = serde_json::from_str(raw)?;
        Ok(Self::new(profiles))
    }

    pub fn profiles(&self) -> &[CandidateProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Distinct professions in the catalog
    pub fn professions(&self) -> Vec<String> {
        distinct(self.profiles.iter().filter_map(|p| p.profession()))
    }

    /// Distinct locations in the catalog
    pub fn locations(&self) -> Vec<String> {
        distinct(self.profiles.iter().filter_map(|p| p.location()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .filter(|v| seen.insert(v.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"name": "Sana", "age": 27, "gender": "Female", "profession": "Doctor", "education": "MBBS", "location": "Lahore"},
        {"name": "Hira", "age": 30, "gender": "Female", "profession": "doctor", "location": "Karachi"},
        {"name": "Bilal", "age": 29, "gender": "Male", "profession": "Software Engineer", "education": "BSCS", "location": "Lahore"}
    ]"#;

    #[test]
    fn test_load_catalog() {
        let store = ProfileStore::from_json_str(CATALOG).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.profiles()[1].education, None);
    }

    #[test]
    fn test_vocabulary_is_distinct_ignoring_case() {
        let store = ProfileStore::from_json_str(CATALOG).unwrap();

        assert_eq!(store.professions(), vec!["Doctor", "Software Engineer"]);
        assert_eq!(store.locations(), vec!["Lahore", "Karachi"]);
    }

    #[test]
    fn test_rejects_malformed_catalog() {
        assert!(matches!(
            ProfileStore::from_json_str(r#"[{"name": "X"}]"#),
            Err(StoreError::Parse(_))
        ));
    }
}
