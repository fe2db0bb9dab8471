//! Core `InferenceClient` trait and `OpenAiClient` implementation.
//!
//! `OpenAiClient` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint. All connection details come from [`InferenceConfig`]; nothing is
//! hardcoded. The client imposes the only timeout in the system — the
//! pipeline itself never cancels an in-flight call.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::InferenceConfig;
use crate::inference::message::ChatMessage;

/// Errors that can occur while talking to the inference service.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// HTTP transport or connection error.
    #[error("inference request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("inference request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse inference response: {0}")]
    Parse(String),

    /// The service returned a response with no usable text content.
    #[error("inference service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            InferenceError::Timeout
        } else {
            InferenceError::Request(e.to_string())
        }
    }
}

/// Async trait wrapping the remote multimodal completion service.
///
/// Implementors must be `Send + Sync` so a single client can be shared by
/// every concurrent request (wrapped in `Arc<dyn InferenceClient>`).
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run one completion over the given conversation and return the text of
    /// the first choice.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError>;
}

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: InferenceConfig,
}

impl OpenAiClient {
    /// Build an `OpenAiClient` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is the fallback
    /// if the builder fails, which does not happen in practice.
    pub fn from_config(config: &InferenceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
        });

        debug!(model = %self.config.model, turns = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        // Surface auth/quota/server failures with their real status instead
        // of misreading the error body as an empty completion.
        let response = response.error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(InferenceError::EmptyResponse)?
            .to_string();

        if text.is_empty() {
            return Err(InferenceError::EmptyResponse);
        }

        Ok(text)
    }
}
