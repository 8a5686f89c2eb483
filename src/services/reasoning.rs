use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling an external collaborator
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("{0} endpoint is not configured")]
    NotConfigured(&'static str),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// A single prompt for the reasoning collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Port for the language-model service that phrases advice and analysis
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Returns the raw text content of the model's reply
    async fn complete(&self, request: ReasoningRequest) -> Result<String, CollaboratorError>;
}

/// Azure OpenAI chat-completions client
///
/// The endpoint is the full deployment URL including `api-version`. When no
/// endpoint is configured every call fails with `NotConfigured`, which the
/// analytics layer treats like any other outage.
pub struct AzureReasoningClient {
    endpoint: Option<String>,
    api_key: String,
    client: Client,
}

impl AzureReasoningClient {
    pub fn new(
        endpoint: Option<String>,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            api_key,
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl ReasoningClient for AzureReasoningClient {
    async fn complete(&self, request: ReasoningRequest) -> Result<String, CollaboratorError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(CollaboratorError::NotConfigured("reasoning"))?;

        let payload = json!({
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(endpoint)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollaboratorError::ApiError(format!(
                "Reasoning request failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let content = json
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| CollaboratorError::InvalidResponse("Missing choices[0].message.content".into()))?;

        tracing::debug!("Reasoning reply received ({} chars)", content.len());

        Ok(content.trim().to_string())
    }
}
