//! Configuration for the chat-completions adapter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible API base (OpenRouter).
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model: a reasoning model with live web access.
pub const DEFAULT_MODEL: &str = "perplexity/sonar-reasoning";

/// Default completion budget per request.
pub const DEFAULT_MAX_TOKENS: u32 = 6000;

/// Default persona sent as the system message of every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert social media competitive \
    intelligence analyst with deep knowledge of platform strategies, content marketing, and \
    digital engagement across industries. Provide comprehensive, data-driven analysis with \
    specific actionable recommendations.";

/// Connection and request settings for [`crate::ChatCompletionsClient`].
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatCompletionsConfig {
    /// Bearer API key.
    pub api_key: String,
    pub model: String,
    /// API base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// Transport-level timeout for one HTTP request.
    pub request_timeout: Duration,
}

impl ChatCompletionsConfig {
    /// Creates a config with OpenRouter defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout: Duration::from_secs(180),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Full URL of the chat-completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// The API key never appears in logs.
impl std::fmt::Debug for ChatCompletionsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
