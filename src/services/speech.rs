use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::reasoning::CollaboratorError;

/// Port for speech-to-text and text-to-speech services
///
/// Audio is opaque here: the client uploads mono 16 kHz 16-bit PCM WAV and
/// receives MP3 back.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Transcribe recorded audio; an empty string means nothing was recognised
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, CollaboratorError>;

    /// Synthesize spoken audio for `text`
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError>;
}

/// Azure Speech REST client
pub struct AzureSpeechClient {
    stt_endpoint: Option<String>,
    tts_endpoint: Option<String>,
    api_key: String,
    voice: String,
    client: Client,
}

impl AzureSpeechClient {
    pub fn new(
        stt_endpoint: Option<String>,
        tts_endpoint: Option<String>,
        api_key: String,
        voice: String,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            stt_endpoint: stt_endpoint.filter(|e| !e.trim().is_empty()),
            tts_endpoint: tts_endpoint.filter(|e| !e.trim().is_empty()),
            api_key,
            voice,
            client,
        })
    }
}

#[async_trait]
impl SpeechClient for AzureSpeechClient {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, CollaboratorError> {
        let endpoint = self
            .stt_endpoint
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("speech-to-text"))?;

        let response = self
            .client
            .post(endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "audio/wav")
            .body(audio)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Transcription failed: {} - {}", status, body);
            return Err(CollaboratorError::ApiError(format!("Transcription failed: {}", status)));
        }

        let json: Value = response.json().await?;

        Ok(extract_transcript(&json))
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError> {
        let endpoint = self
            .tts_endpoint
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("text-to-speech"))?;

        let response = self
            .client
            .post(endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", "audio-16khz-128kbitrate-mono-mp3")
            .body(build_ssml(&self.voice, text))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Speech synthesis failed: {} - {}", status, body);
            return Err(CollaboratorError::ApiError(format!("Speech synthesis failed: {}", status)));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Recognised text from an STT reply, preferring `DisplayText`
fn extract_transcript(json: &Value) -> String {
    json.get("DisplayText")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| json.pointer("/NBest/0/Display").and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn build_ssml(voice: &str, text: &str) -> String {
    format!(
        r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="en-US"><voice name="{}"><prosody rate="0%" pitch="0%">{}</prosody></voice></speak>"#,
        escape_xml(voice),
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
