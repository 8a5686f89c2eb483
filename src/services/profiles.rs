use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::error::MatchError;
use crate::models::{Profile, ProfileRecord};

/// Errors that can occur while loading the profile snapshot
#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error(transparent)]
    Malformed(#[from] MatchError),
}

/// Read-only access to candidate profiles
pub trait ProfileRepository: Send + Sync {
    fn get_profile(&self, user_id: &str) -> Option<&Profile>;

    /// First profile whose name contains `text`, ignoring case
    fn find_by_name_substring(&self, text: &str) -> Option<&Profile>;

    /// Every profile except `user_id` and the `excluded` ids, in load order
    fn list_all_except(&self, user_id: &str, excluded: &HashSet<String>) -> Vec<&Profile>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable set of profiles loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct ProfileSnapshot {
    profiles: Vec<Profile>,
    index: HashMap<String, usize>,
}

impl ProfileSnapshot {
    /// Build a snapshot; on duplicate ids the first profile wins
    pub fn new(profiles: Vec<Profile>) -> Self {
        let mut kept = Vec::with_capacity(profiles.len());
        let mut index = HashMap::with_capacity(profiles.len());

        for profile in profiles {
            if index.contains_key(&profile.user_id) {
                tracing::warn!("Skipping duplicate profile id {}", profile.user_id);
                continue;
            }
            index.insert(profile.user_id.clone(), kept.len());
            kept.push(profile);
        }

        Self { profiles: kept, index }
    }

    /// Parse profiles from CSV with a header row
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, ProfileLoadError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

        let profiles = csv
            .deserialize::<ProfileRecord>()
            .map(|row| -> Result<Profile, ProfileLoadError> { Ok(Profile::try_from(row?)?) })
            .collect::<Result<Vec<_>, ProfileLoadError>>()?;

        Ok(Self::new(profiles))
    }

    /// Load profiles from a CSV file on disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileLoadError> {
        let file = std::fs::File::open(path.as_ref()).map_err(csv::Error::from)?;
        let snapshot = Self::from_reader(file)?;

        tracing::info!("Loaded {} profiles from {}", snapshot.len(), path.as_ref().display());

        Ok(snapshot)
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }
}

impl ProfileRepository for ProfileSnapshot {
    fn get_profile(&self, user_id: &str) -> Option<&Profile> {
        self.index.get(user_id).map(|&i| &self.profiles[i])
    }

    fn find_by_name_substring(&self, text: &str) -> Option<&Profile> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.profiles
            .iter()
            .find(|p| p.name.to_lowercase().contains(&needle))
    }

    fn list_all_except(&self, user_id: &str, excluded: &HashSet<String>) -> Vec<&Profile> {
        self.profiles
            .iter()
            .filter(|p| p.user_id != user_id && !excluded.contains(&p.user_id))
            .collect()
    }

    fn len(&self) -> usize {
        self.profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
user_id,name,age,location_region,interests,openness,conscientiousness,extraversion,agreeableness,neuroticism,pref_age_min,pref_age_max,dealbreakers,matches_attempted,matches_success
u1,Ada Lovelace,29,West Europe,\"hiking,reading\",0.8,0.5,0.3,0.9,0.1,25,35,smoking,10,4
u2,Grace Hopper,34,East US,\"reading,cooking\",0.6,0.7,0.4,0.8,0.2,28,40,long_distance,3,1
u3,Alan Turing,41,UK South,chess,0.9,0.6,0.2,0.5,0.4,30,45,,0,0
";

    #[test]
    fn test_load_from_reader() {
        let snapshot = ProfileSnapshot::from_reader(CSV.as_bytes()).unwrap();

        assert_eq!(snapshot.len(), 3);
        let grace = snapshot.get_profile("u2").unwrap();
        assert_eq!(grace.interests, vec!["reading", "cooking"]);
        assert_eq!(grace.matches_attempted, 3);
        assert!(snapshot.get_profile("missing").is_none());
    }

    #[test]
    fn test_malformed_row_fails_load() {
        let bad = CSV.replace("0.6,0.7,0.4", "0.6,high,0.4");
        let err = ProfileSnapshot::from_reader(bad.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            ProfileLoadError::Malformed(MatchError::MalformedProfile { field: "conscientiousness", .. })
        ));
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let snapshot = ProfileSnapshot::from_reader(CSV.as_bytes()).unwrap();

        assert_eq!(snapshot.find_by_name_substring("HOPPER").unwrap().user_id, "u2");
        assert_eq!(snapshot.find_by_name_substring("a").unwrap().user_id, "u1");
        assert!(snapshot.find_by_name_substring("zed").is_none());
        assert!(snapshot.find_by_name_substring("  ").is_none());
    }

    #[test]
    fn test_list_all_except_skips_self_and_excluded() {
        let snapshot = ProfileSnapshot::from_reader(CSV.as_bytes()).unwrap();
        let excluded: HashSet<String> = ["u3".to_string()].into_iter().collect();

        let ids: Vec<&str> = snapshot
            .list_all_except("u1", &excluded)
            .iter()
            .map(|p| p.user_id.as_str())
            .collect();

        assert_eq!(ids, vec!["u2"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let snapshot = ProfileSnapshot::from_reader(CSV.as_bytes()).unwrap();
        let mut profiles = snapshot.profiles().to_vec();
        let mut dup = profiles[0].clone();
        dup.name = "Impostor".to_string();
        profiles.push(dup);

        let deduped = ProfileSnapshot::new(profiles);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped.get_profile("u1").unwrap().name, "Ada Lovelace");
    }
}
