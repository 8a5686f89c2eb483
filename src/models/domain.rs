use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MatchError;

/// Raw profile row as it appears in the dataset CSV
///
/// Every column is kept as text so that a bad value can be reported with the
/// offending field instead of failing the whole file at the CSV layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub name: String,
    pub age: String,
    pub location_region: String,
    #[serde(default)]
    pub interests: String,
    pub openness: String,
    pub conscientiousness: String,
    pub extraversion: String,
    pub agreeableness: String,
    pub neuroticism: String,
    pub pref_age_min: String,
    pub pref_age_max: String,
    #[serde(default)]
    pub dealbreakers: String,
    #[serde(default)]
    pub matches_attempted: String,
    #[serde(default)]
    pub matches_success: String,
}

/// Big Five personality traits, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl PersonalityTraits {
    /// Trait values in a fixed order
    pub fn values(&self) -> [f64; 5] {
        [
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
        ]
    }
}

/// Validated, immutable candidate profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub age: u32,
    #[serde(rename = "locationRegion")]
    pub location_region: String,
    pub interests: Vec<String>,
    #[serde(flatten)]
    pub traits: PersonalityTraits,
    #[serde(rename = "prefAgeMin")]
    pub pref_age_min: u32,
    #[serde(rename = "prefAgeMax")]
    pub pref_age_max: u32,
    pub dealbreakers: Vec<String>,
    #[serde(rename = "matchesAttempted")]
    pub matches_attempted: u32,
    #[serde(rename = "matchesSuccess")]
    pub matches_success: u32,
}

impl Profile {
    pub fn has_dealbreaker(&self, dealbreaker: &str) -> bool {
        self.dealbreakers.iter().any(|d| d == dealbreaker)
    }

    /// Whether `age` falls inside this profile's preferred range (inclusive)
    pub fn prefers_age(&self, age: u32) -> bool {
        age >= self.pref_age_min && age <= self.pref_age_max
    }
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = MatchError;

    fn try_from(record: ProfileRecord) -> Result<Self, Self::Error> {
        let user_id = record.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(malformed(&user_id, "user_id", "is empty"));
        }

        let traits = PersonalityTraits {
            openness: parse_trait(&user_id, "openness", &record.openness)?,
            conscientiousness: parse_trait(&user_id, "conscientiousness", &record.conscientiousness)?,
            extraversion: parse_trait(&user_id, "extraversion", &record.extraversion)?,
            agreeableness: parse_trait(&user_id, "agreeableness", &record.agreeableness)?,
            neuroticism: parse_trait(&user_id, "neuroticism", &record.neuroticism)?,
        };

        let pref_age_min = parse_count(&user_id, "pref_age_min", &record.pref_age_min)?;
        let pref_age_max = parse_count(&user_id, "pref_age_max", &record.pref_age_max)?;
        if pref_age_min > pref_age_max {
            return Err(malformed(
                &user_id,
                "pref_age_min",
                &format!("{} exceeds pref_age_max {}", pref_age_min, pref_age_max),
            ));
        }

        Ok(Profile {
            age: parse_count(&user_id, "age", &record.age)?,
            name: record.name.trim().to_string(),
            location_region: record.location_region.trim().to_string(),
            interests: split_tags(&record.interests),
            traits,
            pref_age_min,
            pref_age_max,
            dealbreakers: split_tags(&record.dealbreakers),
            matches_attempted: parse_optional_count(&user_id, "matches_attempted", &record.matches_attempted)?,
            matches_success: parse_optional_count(&user_id, "matches_success", &record.matches_success)?,
            user_id,
        })
    }
}

/// Split a comma-delimited tag list into trimmed, non-empty tags
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn malformed(user_id: &str, field: &'static str, reason: &str) -> MatchError {
    MatchError::MalformedProfile {
        user_id: user_id.to_string(),
        field,
        reason: reason.to_string(),
    }
}

fn parse_trait(user_id: &str, field: &'static str, raw: &str) -> Result<f64, MatchError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| malformed(user_id, field, &format!("`{}` is not a number", raw)))?;

    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(malformed(user_id, field, &format!("{} is outside [0, 1]", value)));
    }

    Ok(value)
}

fn parse_count(user_id: &str, field: &'static str, raw: &str) -> Result<u32, MatchError> {
    raw.trim()
        .parse()
        .map_err(|_| malformed(user_id, field, &format!("`{}` is not a whole number", raw)))
}

fn parse_optional_count(user_id: &str, field: &'static str, raw: &str) -> Result<u32, MatchError> {
    if raw.trim().is_empty() {
        return Ok(0);
    }
    parse_count(user_id, field, raw)
}

/// Direction of a swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        }
    }
}

impl FromStr for SwipeDirection {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(SwipeDirection::Left),
            "right" => Ok(SwipeDirection::Right),
            other => Err(MatchError::InvalidInput(format!(
                "direction must be one of: left, right (got `{}`)",
                other
            ))),
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decision per (user, candidate) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub direction: SwipeDirection,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A transcribed feedback note about a real-world interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub transcript: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Creation-time ordering for feedback listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Weights of the compatibility blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub interests: f64,
    pub personality: f64,
    pub age: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            interests: 0.3,
            personality: 0.5,
            age: 0.2,
        }
    }
}

/// Compatibility of a candidate from a viewer's point of view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityScore {
    #[serde(rename = "interestScore")]
    pub interest_score: f64,
    #[serde(rename = "personalityScore")]
    pub personality_score: f64,
    #[serde(rename = "ageScore")]
    pub age_score: f64,
    #[serde(rename = "overallScore")]
    pub overall_score: u32,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: Vec<String>,
    #[serde(rename = "isPromising")]
    pub is_promising: bool,
}

/// Engagement trend reported by the reasoning collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementTrend {
    Improving,
    Declining,
    Stable,
}

impl FromStr for EngagementTrend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "improving" => Ok(EngagementTrend::Improving),
            "declining" => Ok(EngagementTrend::Declining),
            "stable" => Ok(EngagementTrend::Stable),
            other => Err(format!("unknown engagement trend `{}`", other)),
        }
    }
}

/// Dashboard view of a match: compatibility plus feedback-derived signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementAssessment {
    #[serde(rename = "targetName")]
    pub target_name: String,
    #[serde(rename = "matchingScore")]
    pub matching_score: u32,
    #[serde(rename = "interestScore")]
    pub interest_score: u32,
    #[serde(rename = "personalityScore")]
    pub personality_score: u32,
    #[serde(rename = "ageScore")]
    pub age_score: u32,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: Vec<String>,
    #[serde(rename = "isPromising")]
    pub is_promising: bool,
    #[serde(rename = "feedbackKPI")]
    pub feedback_kpi: Option<f64>,
    #[serde(rename = "engagementTrend")]
    pub engagement_trend: Option<EngagementTrend>,
    #[serde(rename = "feedbackCount")]
    pub feedback_count: usize,
    pub recommendation: String,
    #[serde(rename = "shouldContinue")]
    pub should_continue: Option<bool>,
    #[serde(rename = "redFlags")]
    pub red_flags: Vec<String>,
    #[serde(rename = "greenFlags")]
    pub green_flags: Vec<String>,
}

/// Natural-language dating guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceProse {
    #[serde(rename = "generalAdvice", default)]
    pub general_advice: String,
    #[serde(rename = "talkingPoints", default)]
    pub talking_points: Vec<String>,
    #[serde(rename = "avoidList", default)]
    pub avoid_list: Vec<String>,
    #[serde(default)]
    pub compatibility: Vec<String>,
}

/// Full advice payload for a (viewer, candidate) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceReport {
    #[serde(rename = "targetName")]
    pub target_name: String,
    #[serde(rename = "targetAge")]
    pub target_age: u32,
    #[serde(rename = "targetRegion")]
    pub target_region: String,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: Vec<String>,
    #[serde(rename = "recommendDate")]
    pub recommend_date: bool,
    #[serde(rename = "redFlags")]
    pub red_flags: Vec<String>,
    #[serde(flatten)]
    pub prose: AdviceProse,
    pub dealbreakers: Vec<String>,
    /// `true` when the prose is the deterministic fallback
    #[serde(rename = "isFallback")]
    pub is_fallback: bool,
}

/// A liked profile with its score and last-contact information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikedMatch {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(rename = "matchingScore")]
    pub matching_score: u32,
    #[serde(rename = "isPromising")]
    pub is_promising: bool,
    #[serde(rename = "lastFeedbackDate")]
    pub last_feedback_at: Option<DateTime<Utc>>,
    #[serde(rename = "daysSinceLastContact")]
    pub days_since_last_contact: Option<i64>,
}

/// Summary of every feedback note for a pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    #[serde(rename = "targetName")]
    pub target_name: String,
    #[serde(rename = "feedbackCount")]
    pub feedback_count: usize,
    pub summary: String,
}

/// Demo contact card with a generated phone number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactCard {
    pub name: String,
    pub phone: String,
}

/// Outcome of removing a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemovedMatch {
    #[serde(rename = "swipeRemoved")]
    pub swipe_removed: bool,
    #[serde(rename = "feedbackRemoved")]
    pub feedback_removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProfileRecord {
        ProfileRecord {
            user_id: "u1".to_string(),
            name: " Ada ".to_string(),
            age: "29".to_string(),
            location_region: "West Europe".to_string(),
            interests: "hiking, reading ,,cooking".to_string(),
            openness: "0.8".to_string(),
            conscientiousness: "0.5".to_string(),
            extraversion: "0.3".to_string(),
            agreeableness: "0.9".to_string(),
            neuroticism: "0.1".to_string(),
            pref_age_min: "25".to_string(),
            pref_age_max: "35".to_string(),
            dealbreakers: "smoking,long_distance".to_string(),
            matches_attempted: "10".to_string(),
            matches_success: "".to_string(),
        }
    }

    #[test]
    fn test_profile_from_record() {
        let profile = Profile::try_from(record()).unwrap();

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.interests, vec!["hiking", "reading", "cooking"]);
        assert_eq!(profile.matches_attempted, 10);
        assert_eq!(profile.matches_success, 0);
        assert!(profile.has_dealbreaker("long_distance"));
        assert!(profile.prefers_age(25));
        assert!(profile.prefers_age(35));
        assert!(!profile.prefers_age(36));
    }

    #[test]
    fn test_unparsable_trait_is_malformed() {
        let mut bad = record();
        bad.extraversion = "lots".to_string();

        match Profile::try_from(bad) {
            Err(MatchError::MalformedProfile { field, .. }) => assert_eq!(field, "extraversion"),
            other => panic!("expected MalformedProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_trait_is_malformed() {
        let mut bad = record();
        bad.neuroticism = "1.5".to_string();
        assert!(Profile::try_from(bad).is_err());

        let mut nan = record();
        nan.openness = "NaN".to_string();
        assert!(Profile::try_from(nan).is_err());
    }

    #[test]
    fn test_inverted_age_range_is_malformed() {
        let mut bad = record();
        bad.pref_age_min = "40".to_string();
        assert!(matches!(
            Profile::try_from(bad),
            Err(MatchError::MalformedProfile { field: "pref_age_min", .. })
        ));
    }

    #[test]
    fn test_swipe_direction_parsing() {
        assert_eq!("left".parse::<SwipeDirection>().unwrap(), SwipeDirection::Left);
        assert_eq!("right".parse::<SwipeDirection>().unwrap(), SwipeDirection::Right);
        assert!(matches!(
            "up".parse::<SwipeDirection>(),
            Err(MatchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_engagement_trend_parsing() {
        assert_eq!(" Improving ".parse::<EngagementTrend>(), Ok(EngagementTrend::Improving));
        assert!("sideways".parse::<EngagementTrend>().is_err());
    }
}
