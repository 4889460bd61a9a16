//! HTTP client for OpenAI-compatible chat-completions endpoints.

use async_trait::async_trait;
use pipeline::{GenerationError, GenerationRequest, GenerativeTextClient};
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::config::ChatCompletionsConfig;
use crate::wire::{completion_text, parse_retry_after, status_error, ChatRequest};

/// Errors raised while constructing the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("API key must not be empty")]
    MissingApiKey,
    #[error("failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// [`GenerativeTextClient`] over a single chat-completions request per prompt.
///
/// Retries are not performed here; the orchestrator owns the retry policy so
/// that every attempt is visible in the pipeline state.
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    config: ChatCompletionsConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, ClientBuildError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientBuildError::MissingApiKey);
        }
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint(),
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl GenerativeTextClient for ChatCompletionsClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest::build(
            &self.config.model,
            self.config.max_tokens,
            &self.config.system_prompt,
            request,
        );
        debug!(
            stage = %request.stage,
            model = %self.config.model,
            endpoint = %self.endpoint,
            "Sending chat-completions request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let error = status_error(status.as_u16(), &text, retry_after);
            warn!(
                stage = %request.stage,
                status = status.as_u16(),
                error = %error,
                "Chat-completions request failed"
            );
            return Err(error);
        }
        completion_text(&text)
    }
}

fn transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout {
            detail: e.to_string(),
        }
    } else {
        GenerationError::Unavailable {
            detail: e.to_string(),
            retry_after: None,
        }
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
