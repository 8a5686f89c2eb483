use crate::models::{CompatibilityScore, PersonalityTraits, Profile, ScoringWeights};

/// Points each personality trait contributes at perfect alignment
const POINTS_PER_TRAIT: f64 = 20.0;

/// Points lost per year of distance from the preferred-range midpoint
const AGE_PENALTY_PER_YEAR: f64 = 5.0;

/// Deterministic compatibility scorer
///
/// Scoring formula:
/// overall = round(
///     interest_score * 0.3 +       # share of the viewer's interests the candidate has
///     personality_score * 0.5 +    # closeness of the five traits
///     age_score * 0.2              # viewer's age against the candidate's preference
/// )
///
/// The score is directional: it answers "how well does `candidate` suit
/// `viewer`", so `score(a, b)` and `score(b, a)` generally differ.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityScorer {
    weights: ScoringWeights,
    promising_threshold: u32,
}

impl CompatibilityScorer {
    pub fn new(weights: ScoringWeights, promising_threshold: u32) -> Self {
        Self {
            weights,
            promising_threshold,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), 50)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, viewer: &Profile, candidate: &Profile) -> CompatibilityScore {
        let (interest_score, shared_interests) = calculate_interest_score(viewer, candidate);
        let personality_score = calculate_personality_score(&viewer.traits, &candidate.traits);
        let age_score = calculate_age_score(viewer.age, candidate.pref_age_min, candidate.pref_age_max);

        let weighted = interest_score * self.weights.interests
            + personality_score * self.weights.personality
            + age_score * self.weights.age;
        let overall_score = weighted.round().clamp(0.0, 100.0) as u32;

        CompatibilityScore {
            interest_score,
            personality_score,
            age_score,
            overall_score,
            shared_interests,
            is_promising: self.is_promising(overall_score),
        }
    }

    pub fn is_promising(&self, overall_score: u32) -> bool {
        overall_score >= self.promising_threshold
    }
}

impl Default for CompatibilityScorer {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Viewer's interests that the candidate shares, in the viewer's order
pub fn shared_interests(viewer: &Profile, candidate: &Profile) -> Vec<String> {
    viewer
        .interests
        .iter()
        .filter(|interest| candidate.interests.contains(interest))
        .cloned()
        .collect()
}

/// Interest score (0-100)
/// Share of the viewer's interests that the candidate also lists
#[inline]
fn calculate_interest_score(viewer: &Profile, candidate: &Profile) -> (f64, Vec<String>) {
    let shared = shared_interests(viewer, candidate);
    let denominator = viewer.interests.len().max(1) as f64;
    let score = (shared.len() as f64 / denominator * 100.0).min(100.0);

    (score, shared)
}

/// Personality score (0-100)
/// Each trait contributes up to 20 points, shrinking linearly with the difference
#[inline]
fn calculate_personality_score(viewer: &PersonalityTraits, candidate: &PersonalityTraits) -> f64 {
    viewer
        .values()
        .iter()
        .zip(candidate.values().iter())
        .map(|(a, b)| (1.0 - (a - b).abs()) * POINTS_PER_TRAIT)
        .sum()
}

/// Age score (0-100)
/// Full marks inside the preferred range, otherwise decays from its midpoint
#[inline]
fn calculate_age_score(viewer_age: u32, pref_min: u32, pref_max: u32) -> f64 {
    if viewer_age >= pref_min && viewer_age <= pref_max {
        return 100.0;
    }

    let midpoint = (pref_min as f64 + pref_max as f64) / 2.0;
    let deviation = (viewer_age as f64 - midpoint).abs();

    (100.0 - deviation * AGE_PENALTY_PER_YEAR).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(value: f64) -> PersonalityTraits {
        PersonalityTraits {
            openness: value,
            conscientiousness: value,
            extraversion: value,
            agreeableness: value,
            neuroticism: value,
        }
    }

    fn create_test_profile(id: &str, age: u32, interests: &[&str], pref: (u32, u32)) -> Profile {
        Profile {
            user_id: id.to_string(),
            name: format!("User {}", id),
            age,
            location_region: "West Europe".to_string(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            traits: traits(0.5),
            pref_age_min: pref.0,
            pref_age_max: pref.1,
            dealbreakers: vec![],
            matches_attempted: 0,
            matches_success: 0,
        }
    }

    #[test]
    fn test_interest_example() {
        let viewer = create_test_profile("v", 28, &["hiking", "reading"], (20, 40));
        let candidate = create_test_profile("c", 28, &["reading", "cooking"], (20, 40));

        let (score, shared) = calculate_interest_score(&viewer, &candidate);

        assert_eq!(score, 50.0);
        assert_eq!(shared, vec!["reading"]);
    }

    #[test]
    fn test_interest_is_case_sensitive_and_guarded() {
        let viewer = create_test_profile("v", 28, &["Reading"], (20, 40));
        let candidate = create_test_profile("c", 28, &["reading"], (20, 40));
        assert_eq!(calculate_interest_score(&viewer, &candidate).0, 0.0);

        let empty = create_test_profile("e", 28, &[], (20, 40));
        assert_eq!(calculate_interest_score(&empty, &candidate).0, 0.0);
    }

    #[test]
    fn test_personality_boundaries() {
        assert_eq!(calculate_personality_score(&traits(0.3), &traits(0.3)), 100.0);
        assert_eq!(calculate_personality_score(&traits(0.0), &traits(1.0)), 0.0);

        let half = calculate_personality_score(&traits(0.25), &traits(0.75));
        assert!((half - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_age_gate_is_inclusive() {
        assert_eq!(calculate_age_score(20, 20, 30), 100.0);
        assert_eq!(calculate_age_score(30, 20, 30), 100.0);
        assert_eq!(calculate_age_score(31, 20, 30), 70.0);
    }

    #[test]
    fn test_age_example() {
        // midpoint 25, 15 years away
        assert_eq!(calculate_age_score(40, 20, 30), 25.0);
        assert_eq!(calculate_age_score(60, 20, 30), 0.0);
    }

    #[test]
    fn test_overall_blend() {
        let scorer = CompatibilityScorer::with_default_weights();
        let viewer = create_test_profile("v", 40, &["hiking", "reading"], (20, 60));
        let candidate = create_test_profile("c", 25, &["reading", "cooking"], (20, 30));

        let score = scorer.score(&viewer, &candidate);

        // 0.3 * 50 + 0.5 * 100 + 0.2 * 25 = 70
        assert_eq!(score.overall_score, 70);
        assert!(score.is_promising);
        assert_eq!(score.shared_interests, vec!["reading"]);
    }

    #[test]
    fn test_promising_threshold() {
        let scorer = CompatibilityScorer::with_default_weights();
        assert!(scorer.is_promising(50));
        assert!(!scorer.is_promising(49));
    }

    #[test]
    fn test_score_is_deterministic_and_directional() {
        let scorer = CompatibilityScorer::with_default_weights();
        let viewer = create_test_profile("v", 33, &["hiking", "reading", "chess"], (25, 35));
        let mut candidate = create_test_profile("c", 50, &["reading"], (30, 40));
        candidate.traits.openness = 0.9;

        let first = scorer.score(&viewer, &candidate);
        let second = scorer.score(&viewer, &candidate);
        assert_eq!(first, second);
        assert_eq!(first.personality_score.to_bits(), second.personality_score.to_bits());

        let reverse = scorer.score(&candidate, &viewer);
        assert_ne!(first, reverse);
        assert_eq!(reverse.interest_score, 100.0);
    }
}
