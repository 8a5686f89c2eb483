// Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use cupid_swipe::core::Matchmaker;
use cupid_swipe::models::{PersonalityTraits, Profile};
use cupid_swipe::services::{
    CollaboratorError, LedgerStore, ProfileSnapshot, ReasoningClient, ReasoningRequest, SpeechClient,
};

/// Reasoning service that replays a fixed reply and records every prompt
pub struct StubReasoning {
    reply: Option<String>,
    pub requests: Mutex<Vec<ReasoningRequest>>,
}

impl StubReasoning {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningClient for StubReasoning {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, CollaboratorError> {
        self.requests.lock().unwrap().push(request);
        self.reply
            .clone()
            .ok_or_else(|| CollaboratorError::ApiError("Reasoning request failed: 503".to_string()))
    }
}

/// Speech service with a canned transcript and canned audio
pub struct StubSpeech {
    transcript: Option<String>,
    audio: Option<Vec<u8>>,
}

impl StubSpeech {
    pub fn new(transcript: Option<&str>, audio: Option<&[u8]>) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.map(str::to_string),
            audio: audio.map(<[u8]>::to_vec),
        })
    }

    pub fn offline() -> Arc<Self> {
        Self::new(None, None)
    }
}

#[async_trait]
impl SpeechClient for StubSpeech {
    async fn transcribe(&self, _audio: Vec<u8>) -> Result<String, CollaboratorError> {
        self.transcript
            .clone()
            .ok_or(CollaboratorError::NotConfigured("speech-to-text"))
    }

    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.audio
            .clone()
            .ok_or(CollaboratorError::NotConfigured("text-to-speech"))
    }
}

pub fn traits(value: f64) -> PersonalityTraits {
    PersonalityTraits {
        openness: value,
        conscientiousness: value,
        extraversion: value,
        agreeableness: value,
        neuroticism: value,
    }
}

pub fn create_test_profile(id: &str, name: &str, age: u32, interests: &[&str]) -> Profile {
    Profile {
        user_id: id.to_string(),
        name: name.to_string(),
        age,
        location_region: "West Europe".to_string(),
        interests: interests.iter().map(|s| s.to_string()).collect(),
        traits: traits(0.5),
        pref_age_min: 20,
        pref_age_max: 40,
        dealbreakers: vec![],
        matches_attempted: 0,
        matches_success: 0,
    }
}

/// Four profiles: u1 is the viewer in most tests
pub fn test_profiles() -> Vec<Profile> {
    vec![
        create_test_profile("u1", "Ada Lovelace", 29, &["hiking", "reading"]),
        create_test_profile("u2", "Grace Hopper", 31, &["reading", "cooking"]),
        create_test_profile("u3", "Alan Turing", 34, &["chess"]),
        create_test_profile("u4", "Hedy Lamarr", 27, &["film", "hiking"]),
    ]
}

pub async fn create_matchmaker(
    reasoning: Arc<StubReasoning>,
    speech: Arc<StubSpeech>,
) -> Matchmaker {
    let ledger = LedgerStore::in_memory().await.unwrap();
    Matchmaker::new(Arc::new(ProfileSnapshot::new(test_profiles())), ledger, reasoning, speech)
}
