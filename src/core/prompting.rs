use std::time::Duration;

use crate::models::{FeedbackEntry, Profile};
use crate::services::{CollaboratorError, ReasoningClient, ReasoningRequest};

/// Outcome of a collaborator-backed analysis
///
/// Analytics paths never fail because the reasoning service did; they carry
/// the reason for the fallback instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis<T> {
    Analyzed(T),
    Fallback { reason: String },
}

impl<T> Analysis<T> {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Analysis::Fallback { reason: reason.into() }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Analysis::Fallback { .. })
    }

    pub fn analyzed(self) -> Option<T> {
        match self {
            Analysis::Analyzed(value) => Some(value),
            Analysis::Fallback { .. } => None,
        }
    }
}

/// Remove a surrounding markdown code fence (```json ... ```), if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Send one request, bounded by `timeout`
pub async fn ask(
    reasoning: &dyn ReasoningClient,
    request: ReasoningRequest,
    timeout: Duration,
) -> Result<String, CollaboratorError> {
    match tokio::time::timeout(timeout, reasoning.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout(timeout)),
    }
}

/// Transcripts in creation order, numbered from 1
pub fn numbered_transcripts(entries: &[FeedbackEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("Entry {}: \"{}\"", i + 1, entry.transcript))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn engagement_request(target: &Profile, entries: &[FeedbackEntry]) -> ReasoningRequest {
    let prompt = format!(
        r#"These are a user's own notes, oldest first, written after interacting with their match {name}:

{notes}

Assess how things are going and reply with JSON only, in exactly this shape:
{{
  "sentimentScore": <integer 0-100, overall positivity of the notes>,
  "engagementTrend": "improving" | "declining" | "stable",
  "redFlags": [<concerns raised in the notes>],
  "greenFlags": [<positive signals in the notes>],
  "shouldContinue": <true or false>,
  "recommendation": "<one or two sentences of advice>"
}}"#,
        name = target.name,
        notes = numbered_transcripts(entries),
    );

    ReasoningRequest {
        system_prompt: "You analyse dating feedback. Reply with valid JSON and nothing else."
            .to_string(),
        prompt,
        temperature: 0.5,
        max_tokens: 400,
    }
}

pub fn advice_request(
    viewer: &Profile,
    candidate: &Profile,
    shared_interests: &[String],
    red_flags: &[String],
) -> ReasoningRequest {
    let prompt = format!(
        r#"Give dating advice to {viewer_name} ({viewer_age}, {viewer_region}) about meeting {name} ({age}, {region}).

{viewer_name}'s interests: {viewer_interests}
{name}'s interests: {interests}
Shared interests: {shared}
{name}'s dealbreakers: {dealbreakers}
Known concerns: {flags}

Reply with JSON only, in exactly this shape:
{{
  "generalAdvice": "<two or three sentences>",
  "talkingPoints": [<three conversation starters>],
  "avoidList": [<topics or behaviours to avoid>],
  "compatibility": [<short observations about the pair>]
}}"#,
        viewer_name = viewer.name,
        viewer_age = viewer.age,
        viewer_region = viewer.location_region,
        viewer_interests = join_or(&viewer.interests, "none listed"),
        name = candidate.name,
        age = candidate.age,
        region = candidate.location_region,
        interests = join_or(&candidate.interests, "none listed"),
        shared = join_or(shared_interests, "none"),
        dealbreakers = join_or(&candidate.dealbreakers, "none"),
        flags = if red_flags.is_empty() {
            "none".to_string()
        } else {
            red_flags.join(" ")
        },
    );

    ReasoningRequest {
        system_prompt: "You are a warm, practical dating coach. Reply with valid JSON and nothing else."
            .to_string(),
        prompt,
        temperature: 0.7,
        max_tokens: 800,
    }
}

pub fn summary_request(target: &Profile, entries: &[FeedbackEntry]) -> ReasoningRequest {
    let prompt = format!(
        r#"A user recorded these notes, oldest first, about their match {name}:

{notes}

Summarise in a short paragraph how the interactions have gone, what stands out, and anything worth keeping in mind."#,
        name = target.name,
        notes = numbered_transcripts(entries),
    );

    ReasoningRequest {
        system_prompt: "You summarise dating feedback for the person who wrote it. Speak to them directly."
            .to_string(),
        prompt,
        temperature: 0.7,
        max_tokens: 300,
    }
}

pub fn wingman_request(
    viewer: &Profile,
    candidate: &Profile,
    shared_interests: &[String],
) -> ReasoningRequest {
    let prompt = format!(
        r#"{viewer_name} is about to meet {name}, who is {age} and lives in {region}.
{name} is into {interests}. They have {shared} in common.

Write a short spoken pep talk (under 120 words) as an upbeat wingman: build confidence, suggest one opener, and keep it natural. Plain text only, it will be read aloud."#,
        viewer_name = viewer.name,
        name = candidate.name,
        age = candidate.age,
        region = candidate.location_region,
        interests = join_or(&candidate.interests, "a few things"),
        shared = join_or(shared_interests, "nothing obvious yet"),
    );

    ReasoningRequest {
        system_prompt: "You are an encouraging wingman giving a quick pep talk before a date."
            .to_string(),
        prompt,
        temperature: 0.8,
        max_tokens: 300,
    }
}
