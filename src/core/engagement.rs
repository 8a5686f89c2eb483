use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::core::prompting::{self, Analysis};
use crate::models::{CompatibilityScore, EngagementAssessment, EngagementTrend, FeedbackEntry, Profile};
use crate::services::ReasoningClient;

pub const NOT_ENOUGH_DATA: &str =
    "Not enough data yet - record some feedback after your interactions!";
pub const ANALYSIS_UNAVAILABLE: &str = "Unable to analyze feedback at this time.";

/// Validated reply of the engagement prompt
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementSignal {
    pub sentiment_score: f64,
    pub trend: EngagementTrend,
    pub red_flags: Vec<String>,
    pub green_flags: Vec<String>,
    pub should_continue: bool,
    pub recommendation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEngagement {
    sentiment_score: f64,
    engagement_trend: String,
    #[serde(default)]
    red_flags: Vec<String>,
    #[serde(default)]
    green_flags: Vec<String>,
    should_continue: bool,
    recommendation: String,
}

/// Parse and validate the collaborator's JSON reply
pub fn parse_engagement(raw: &str) -> Result<EngagementSignal, String> {
    let parsed: RawEngagement = serde_json::from_str(prompting::strip_code_fences(raw))
        .map_err(|e| format!("engagement reply is not valid JSON: {}", e))?;

    if !parsed.sentiment_score.is_finite() || !(0.0..=100.0).contains(&parsed.sentiment_score) {
        return Err(format!("sentimentScore {} is outside [0, 100]", parsed.sentiment_score));
    }

    let trend: EngagementTrend = parsed.engagement_trend.parse()?;

    let recommendation = parsed.recommendation.trim().to_string();
    if recommendation.is_empty() {
        return Err("recommendation is empty".to_string());
    }

    Ok(EngagementSignal {
        sentiment_score: parsed.sentiment_score,
        trend,
        red_flags: parsed.red_flags,
        green_flags: parsed.green_flags,
        should_continue: parsed.should_continue,
        recommendation,
    })
}

/// Turns a feedback history into the dashboard assessment
pub struct EngagementAnalyzer {
    reasoning: Arc<dyn ReasoningClient>,
    timeout: Duration,
}

impl EngagementAnalyzer {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, timeout: Duration) -> Self {
        Self { reasoning, timeout }
    }

    /// Ask the collaborator about `entries` (oldest first)
    pub async fn analyze(&self, target: &Profile, entries: &[FeedbackEntry]) -> Analysis<EngagementSignal> {
        let request = prompting::engagement_request(target, entries);

        let raw = match prompting::ask(self.reasoning.as_ref(), request, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Engagement analysis for {} unavailable: {}", target.user_id, e);
                return Analysis::fallback(e.to_string());
            }
        };

        match parse_engagement(&raw) {
            Ok(signal) => Analysis::Analyzed(signal),
            Err(reason) => {
                tracing::warn!("Discarding engagement analysis for {}: {}", target.user_id, reason);
                Analysis::fallback(reason)
            }
        }
    }

    pub async fn assess(
        &self,
        target: &Profile,
        score: &CompatibilityScore,
        entries: &[FeedbackEntry],
    ) -> EngagementAssessment {
        let mut assessment = EngagementAssessment {
            target_name: target.name.clone(),
            matching_score: score.overall_score,
            interest_score: score.interest_score.round() as u32,
            personality_score: score.personality_score.round() as u32,
            age_score: score.age_score.round() as u32,
            shared_interests: score.shared_interests.clone(),
            is_promising: score.is_promising,
            feedback_kpi: None,
            engagement_trend: None,
            feedback_count: entries.len(),
            recommendation: NOT_ENOUGH_DATA.to_string(),
            should_continue: None,
            red_flags: Vec::new(),
            green_flags: Vec::new(),
        };

        if entries.is_empty() {
            return assessment;
        }

        match self.analyze(target, entries).await {
            Analysis::Analyzed(signal) => {
                assessment.feedback_kpi = Some(signal.sentiment_score);
                assessment.engagement_trend = Some(signal.trend);
                assessment.should_continue = Some(signal.should_continue);
                assessment.recommendation = signal.recommendation;
                assessment.red_flags = signal.red_flags;
                assessment.green_flags = signal.green_flags;
            }
            Analysis::Fallback { .. } => {
                assessment.recommendation = ANALYSIS_UNAVAILABLE.to_string();
            }
        }

        assessment
    }
}
