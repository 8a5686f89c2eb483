use std::sync::Arc;
use std::time::Duration;

use crate::core::prompting::{self, Analysis};
use crate::core::scoring::shared_interests;
use crate::models::{AdviceProse, AdviceReport, Profile};
use crate::services::ReasoningClient;

/// Age difference above which a viewer's `age_gap` dealbreaker applies
const AGE_GAP_LIMIT: u32 = 15;

const DISTANCE_DEALBREAKERS: [&str; 2] = ["long_distance", "different_timezone"];

/// Rule-based incompatibilities between `viewer` and `candidate`
///
/// These are computed before any collaborator call and decide
/// `recommend_date` on their own.
pub fn detect_red_flags(viewer: &Profile, candidate: &Profile) -> Vec<String> {
    let mut flags = Vec::new();

    if !candidate.prefers_age(viewer.age) {
        flags.push(format!(
            "You are {}, but they prefer ages {}-{}.",
            viewer.age, candidate.pref_age_min, candidate.pref_age_max
        ));
    }

    if viewer.location_region != candidate.location_region
        && DISTANCE_DEALBREAKERS.iter().any(|d| candidate.has_dealbreaker(d))
    {
        flags.push(format!(
            "You're in {}, they're in {}, and they have dealbreakers about distance/timezone.",
            viewer.location_region, candidate.location_region
        ));
    }

    let age_gap = viewer.age.abs_diff(candidate.age);
    if viewer.has_dealbreaker("age_gap") && age_gap > AGE_GAP_LIMIT {
        flags.push(format!(
            "There's a {} year age gap, and you have age_gap as a dealbreaker.",
            age_gap
        ));
    }

    flags
}

pub fn recommend_date(red_flags: &[String]) -> bool {
    red_flags.is_empty()
}

/// Deterministic prose used when the reasoning service cannot help
pub fn fallback_prose(candidate: &Profile, shared: &[String], red_flags: &[String]) -> AdviceProse {
    let general_advice = if red_flags.is_empty() {
        "This looks like a promising match! You have things in common and no obvious dealbreakers."
            .to_string()
    } else {
        format!(
            "There are some compatibility concerns to consider: {} You may want to think carefully before pursuing this match.",
            red_flags.join(" ")
        )
    };

    let opener = match (shared.is_empty(), candidate.interests.first()) {
        (false, _) => format!(
            "You both enjoy {} - great conversation starters!",
            shared.join(" and ")
        ),
        (true, Some(first)) => format!("Ask about their interests in {} to learn something new.", first),
        (true, None) => "Ask about what they enjoy to learn something new.".to_string(),
    };

    AdviceProse {
        general_advice,
        talking_points: vec![
            opener,
            format!("Show genuine curiosity about their life in {}.", candidate.location_region),
        ],
        avoid_list: candidate
            .dealbreakers
            .iter()
            .map(|d| format!("Be mindful of their dealbreaker: {}", d.replace('_', " ")))
            .collect(),
        compatibility: vec!["Take time to discover your connection naturally.".to_string()],
    }
}

/// Parse and validate the collaborator's advice JSON
///
/// `generalAdvice` and at least one talking point are required; the other
/// lists may be missing. Blank entries are dropped.
pub fn parse_advice(raw: &str) -> Result<AdviceProse, String> {
    let parsed: AdviceProse = serde_json::from_str(prompting::strip_code_fences(raw))
        .map_err(|e| format!("advice reply is not valid JSON: {}", e))?;

    let general_advice = parsed.general_advice.trim().to_string();
    if general_advice.is_empty() {
        return Err("generalAdvice is empty".to_string());
    }

    let talking_points = non_blank(parsed.talking_points);
    if talking_points.is_empty() {
        return Err("talkingPoints is empty".to_string());
    }

    Ok(AdviceProse {
        general_advice,
        talking_points,
        avoid_list: non_blank(parsed.avoid_list),
        compatibility: non_blank(parsed.compatibility),
    })
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Builds advice reports from rules plus collaborator prose
pub struct AdviceAssembler {
    reasoning: Arc<dyn ReasoningClient>,
    timeout: Duration,
}

impl AdviceAssembler {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, timeout: Duration) -> Self {
        Self { reasoning, timeout }
    }

    async fn prose(
        &self,
        viewer: &Profile,
        candidate: &Profile,
        shared: &[String],
        red_flags: &[String],
    ) -> Analysis<AdviceProse> {
        let request = prompting::advice_request(viewer, candidate, shared, red_flags);

        let outcome = match prompting::ask(self.reasoning.as_ref(), request, self.timeout).await {
            Ok(raw) => parse_advice(&raw),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(prose) => Analysis::Analyzed(prose),
            Err(reason) => {
                tracing::warn!(
                    "Falling back to rule-based advice for {} -> {}: {}",
                    viewer.user_id,
                    candidate.user_id,
                    reason
                );
                Analysis::fallback(reason)
            }
        }
    }

    pub async fn assemble(&self, viewer: &Profile, candidate: &Profile) -> AdviceReport {
        let shared = shared_interests(viewer, candidate);
        let red_flags = detect_red_flags(viewer, candidate);

        let (prose, is_fallback) = match self.prose(viewer, candidate, &shared, &red_flags).await {
            Analysis::Analyzed(prose) => (prose, false),
            Analysis::Fallback { .. } => (fallback_prose(candidate, &shared, &red_flags), true),
        };

        AdviceReport {
            target_name: candidate.name.clone(),
            target_age: candidate.age,
            target_region: candidate.location_region.clone(),
            shared_interests: shared,
            recommend_date: recommend_date(&red_flags),
            red_flags,
            prose,
            dealbreakers: candidate.dealbreakers.clone(),
            is_fallback,
        }
    }
}
