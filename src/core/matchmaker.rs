use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DEFAULT_REASONING_TIMEOUT_SECS, DEFAULT_SPEECH_TIMEOUT_SECS};
use crate::core::advice::AdviceAssembler;
use crate::core::engagement::EngagementAnalyzer;
use crate::core::prompting;
use crate::core::scoring::{shared_interests, CompatibilityScorer};
use crate::error::MatchError;
use crate::models::{
    AdviceReport, ContactCard, EngagementAssessment, FeedbackEntry, FeedbackSummary, LikedMatch,
    Profile, RemovedMatch, SortOrder, SwipeDirection, SwipeRecord,
};
use crate::services::{CollaboratorError, LedgerStore, ProfileRepository, ReasoningClient, SpeechClient, SwipeStats};

pub const NO_FEEDBACK_YET: &str = "No feedback recorded yet. Use the feedback button to record your thoughts after interacting with this person.";

/// Region calling codes for the demo contact card; unknown regions use +1
const REGION_CALLING_CODES: &[(&str, &str)] = &[
    ("North America", "+1"),
    ("Europe", "+44"),
    ("Asia", "+81"),
    ("Australia", "+61"),
    ("South America", "+55"),
    ("Africa", "+27"),
];

/// Main matchmaking orchestrator
///
/// Wires the profile snapshot, the ledgers, the scorer and the
/// collaborators into the user-facing operations. Holds no mutable state of
/// its own; everything durable lives in the [`LedgerStore`].
pub struct Matchmaker {
    profiles: Arc<dyn ProfileRepository>,
    ledger: LedgerStore,
    scorer: CompatibilityScorer,
    reasoning: Arc<dyn ReasoningClient>,
    speech: Arc<dyn SpeechClient>,
    engagement: EngagementAnalyzer,
    advice: AdviceAssembler,
    reasoning_timeout: Duration,
    speech_timeout: Duration,
}

impl Matchmaker {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        ledger: LedgerStore,
        reasoning: Arc<dyn ReasoningClient>,
        speech: Arc<dyn SpeechClient>,
    ) -> Self {
        let reasoning_timeout = Duration::from_secs(DEFAULT_REASONING_TIMEOUT_SECS);

        Self {
            profiles,
            ledger,
            scorer: CompatibilityScorer::default(),
            engagement: EngagementAnalyzer::new(reasoning.clone(), reasoning_timeout),
            advice: AdviceAssembler::new(reasoning.clone(), reasoning_timeout),
            reasoning,
            speech,
            reasoning_timeout,
            speech_timeout: Duration::from_secs(DEFAULT_SPEECH_TIMEOUT_SECS),
        }
    }

    pub fn with_scorer(mut self, scorer: CompatibilityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Outer bounds on collaborator calls
    pub fn with_timeouts(mut self, reasoning: Duration, speech: Duration) -> Self {
        self.reasoning_timeout = reasoning;
        self.speech_timeout = speech;
        self.engagement = EngagementAnalyzer::new(self.reasoning.clone(), reasoning);
        self.advice = AdviceAssembler::new(self.reasoning.clone(), reasoning);
        self
    }

    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.profiles.as_ref()
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    fn require_profile(&self, user_id: &str) -> Result<&Profile, MatchError> {
        self.profiles
            .get_profile(user_id)
            .ok_or_else(|| MatchError::NotFound(format!("user {}", user_id)))
    }

    /// Look a user up by a case-insensitive fragment of their name
    pub fn login(&self, name: &str) -> Result<&Profile, MatchError> {
        let profile = self
            .profiles
            .find_by_name_substring(name)
            .ok_or_else(|| MatchError::NotFound(format!("no user named like `{}`", name.trim())))?;

        tracing::info!("Login as {} ({})", profile.name, profile.user_id);

        Ok(profile)
    }

    /// Profiles the user has not swiped on yet, in snapshot order
    pub async fn candidate_feed(&self, user_id: &str) -> Result<Vec<Profile>, MatchError> {
        let swiped = self.ledger.swipes().list_swiped(user_id).await?;

        let feed: Vec<Profile> = self
            .profiles
            .list_all_except(user_id, &swiped)
            .into_iter()
            .cloned()
            .collect();

        tracing::debug!("Feed for {}: {} candidates ({} swiped)", user_id, feed.len(), swiped.len());

        Ok(feed)
    }

    pub async fn swipe(
        &self,
        user_id: &str,
        candidate_id: &str,
        direction: &str,
    ) -> Result<SwipeRecord, MatchError> {
        let direction: SwipeDirection = direction.parse()?;

        if user_id == candidate_id {
            return Err(MatchError::InvalidInput("cannot swipe on yourself".to_string()));
        }
        self.require_profile(user_id)?;
        self.require_profile(candidate_id)?;

        self.ledger.swipes().record_swipe(user_id, candidate_id, direction).await
    }

    /// Liked profiles, most recently liked first
    pub async fn liked(&self, user_id: &str) -> Result<Vec<LikedMatch>, MatchError> {
        self.liked_as_of(user_id, Utc::now()).await
    }

    /// Liked profiles with `days_since_last_contact` measured against `now`
    pub async fn liked_as_of(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<LikedMatch>, MatchError> {
        let viewer = self.require_profile(user_id)?;
        let liked_ids = self.ledger.swipes().list_liked(user_id).await?;
        let feedback = self.ledger.feedback();

        let mut matches = Vec::with_capacity(liked_ids.len());
        for candidate_id in liked_ids {
            let Some(candidate) = self.profiles.get_profile(&candidate_id) else {
                tracing::warn!("Liked profile {} is not in the snapshot, skipping", candidate_id);
                continue;
            };

            let score = self.scorer.score(viewer, candidate);
            let last_feedback_at = feedback.last_feedback_date(user_id, &candidate_id).await?;

            matches.push(LikedMatch {
                profile: candidate.clone(),
                matching_score: score.overall_score,
                is_promising: score.is_promising,
                last_feedback_at,
                days_since_last_contact: last_feedback_at.map(|at| (now - at).num_days().max(0)),
            });
        }

        Ok(matches)
    }

    pub async fn unlike(&self, user_id: &str, candidate_id: &str) -> Result<bool, MatchError> {
        self.ledger.swipes().remove_swipe(user_id, candidate_id).await
    }

    /// Forget a match entirely: its swipe and every feedback note
    pub async fn remove_match(&self, user_id: &str, target_id: &str) -> Result<RemovedMatch, MatchError> {
        self.ledger.remove_match(user_id, target_id).await
    }

    pub async fn swipe_stats(&self, user_id: &str) -> Result<SwipeStats, MatchError> {
        self.ledger.swipes().swipe_stats(user_id).await
    }

    /// Transcribe a recorded note and append it to the pair's history
    pub async fn submit_feedback(
        &self,
        user_id: &str,
        target_id: &str,
        audio: Vec<u8>,
    ) -> Result<FeedbackEntry, MatchError> {
        if audio.is_empty() {
            return Err(MatchError::InvalidInput("no audio data received".to_string()));
        }

        let bytes = audio.len();
        let transcript = match tokio::time::timeout(self.speech_timeout, self.speech.transcribe(audio)).await {
            Ok(Ok(transcript)) => transcript,
            Ok(Err(e)) => return Err(MatchError::CollaboratorUnavailable(e.to_string())),
            Err(_) => {
                return Err(MatchError::CollaboratorUnavailable(
                    CollaboratorError::Timeout(self.speech_timeout).to_string(),
                ))
            }
        };

        tracing::debug!("Transcribed {} bytes of audio for {} -> {}", bytes, user_id, target_id);

        self.ledger.feedback().append_feedback(user_id, target_id, &transcript).await
    }

    /// Feedback notes for a pair, newest first
    pub async fn feedback(&self, user_id: &str, target_id: &str) -> Result<Vec<FeedbackEntry>, MatchError> {
        self.ledger
            .feedback()
            .list_feedback(user_id, target_id, SortOrder::Descending)
            .await
    }

    pub async fn feedback_summary(
        &self,
        user_id: &str,
        target_id: &str,
    ) -> Result<FeedbackSummary, MatchError> {
        let target = self.require_profile(target_id)?;
        let entries = self
            .ledger
            .feedback()
            .list_feedback(user_id, target_id, SortOrder::Ascending)
            .await?;

        if entries.is_empty() {
            return Ok(FeedbackSummary {
                target_name: target.name.clone(),
                feedback_count: 0,
                summary: NO_FEEDBACK_YET.to_string(),
            });
        }

        let request = prompting::summary_request(target, &entries);
        let summary = match prompting::ask(self.reasoning.as_ref(), request, self.reasoning_timeout).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!("Feedback summary for {} -> {} unavailable: {}", user_id, target_id, e);
                }
                format!(
                    "You have {} feedback entries recorded. Unable to generate AI summary at this time.",
                    entries.len()
                )
            }
        };

        Ok(FeedbackSummary {
            target_name: target.name.clone(),
            feedback_count: entries.len(),
            summary,
        })
    }

    /// Compatibility plus the feedback-derived engagement signal
    pub async fn dashboard(
        &self,
        user_id: &str,
        target_id: &str,
    ) -> Result<EngagementAssessment, MatchError> {
        let viewer = self.require_profile(user_id)?;
        let target = self.require_profile(target_id)?;

        let score = self.scorer.score(viewer, target);
        let entries = self
            .ledger
            .feedback()
            .list_feedback(user_id, target_id, SortOrder::Ascending)
            .await?;

        Ok(self.engagement.assess(target, &score, &entries).await)
    }

    pub async fn advice(&self, user_id: &str, target_id: &str) -> Result<AdviceReport, MatchError> {
        let viewer = self.require_profile(user_id)?;
        let target = self.require_profile(target_id)?;

        Ok(self.advice.assemble(viewer, target).await)
    }

    /// Spoken pep talk before meeting `target_id`, as MP3 bytes
    pub async fn wingman(&self, user_id: &str, target_id: &str) -> Result<Vec<u8>, MatchError> {
        let viewer = self.require_profile(user_id)?;
        let target = self.require_profile(target_id)?;

        let shared = shared_interests(viewer, target);
        let request = prompting::wingman_request(viewer, target, &shared);
        let narrative = prompting::ask(self.reasoning.as_ref(), request, self.reasoning_timeout)
            .await
            .map_err(|e| MatchError::CollaboratorUnavailable(e.to_string()))?;

        let narrative = narrative.trim();
        if narrative.is_empty() {
            return Err(MatchError::MalformedResponse("wingman narrative is empty".to_string()));
        }

        let audio = match tokio::time::timeout(self.speech_timeout, self.speech.synthesize(narrative)).await {
            Ok(result) => result.map_err(|e| MatchError::CollaboratorUnavailable(e.to_string()))?,
            Err(_) => {
                return Err(MatchError::CollaboratorUnavailable(
                    CollaboratorError::Timeout(self.speech_timeout).to_string(),
                ))
            }
        };

        tracing::info!("Generated {} bytes of wingman audio for {} -> {}", audio.len(), user_id, target_id);

        Ok(audio)
    }

    pub fn contact(&self, user_id: &str) -> Result<ContactCard, MatchError> {
        let profile = self.require_profile(user_id)?;

        Ok(ContactCard {
            name: profile.name.clone(),
            phone: fake_phone_number(&profile.user_id, &profile.location_region),
        })
    }
}

/// Deterministic demo phone number derived from the id and region
pub fn fake_phone_number(user_id: &str, region: &str) -> String {
    let code = REGION_CALLING_CODES
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, code)| *code)
        .unwrap_or("+1");

    let hash: u64 = user_id.chars().map(|c| c as u64).sum();
    let area = hash % 900 + 100;

    format!("{} ({}) {}-{}", code, area, area, hash % 9000 + 1000)
}
