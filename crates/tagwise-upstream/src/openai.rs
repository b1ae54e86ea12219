//! OpenAI-compatible chat-completions provider

use crate::error::{ApiError, UpstreamError};
use crate::provider::Provider;
use crate::registry::RegistryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tagwise_core::{ChatMessage, ProviderConfig};
use tagwise_telemetry::{preview, redact_api_key};

const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Provider speaking the `/chat/completions` wire format
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub const NAME: &'static str = "openai";

    pub fn new(config: &ProviderConfig) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidConfig {
            name: Self::NAME.to_string(),
            reason,
        };

        if config.api_key.trim().is_empty() {
            return Err(invalid("api_key is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        tracing::debug!(
            base_url = %config.base_url,
            model = %config.model,
            api_key = %redact_api_key(&config.api_key),
            "configured openai provider"
        );

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact_api_key(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body, retry_after).into());
        }

        parse_completion(&body)
    }
}

fn parse_completion(body: &str) -> Result<String, UpstreamError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::malformed(e.to_string(), preview(body, false)))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(UpstreamError::NoChoicesReturned)?;
    Ok(choice.message.content.unwrap_or_default())
}
