//! Runtime configuration: optional TOML file plus environment overrides.
//!
//! ```toml
//! [llm]
//! base_url = "https://openrouter.ai/api/v1"
//! model = "perplexity/sonar-reasoning"
//! max_tokens = 6000
//! request_timeout_secs = 180
//!
//! [pipeline]
//! stage_timeout_secs = 120
//! max_retries = 2
//! initial_backoff_ms = 500
//! max_backoff_ms = 8000
//! ```
//!
//! The API key is only ever read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use llm::ChatCompletionsConfig;
use nodes::{OrchestratorConfig, RetrySchedule};
use serde::Deserialize;
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const MODEL_VAR: &str = "COMPETITOR_ANALYSIS_MODEL";
pub const BASE_URL_VAR: &str = "COMPETITOR_ANALYSIS_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("environment variable {0} is not set")]
    MissingApiKey(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub llm: LlmSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub stage_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved and validated configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: ChatCompletionsConfig,
    pub orchestrator: OrchestratorConfig,
}

impl AppConfig {
    /// Loads the optional file and applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merges file values, environment overrides and defaults, then validates.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = env(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_VAR))?;

        let mut llm = ChatCompletionsConfig::new(api_key);
        if let Some(base_url) = env(BASE_URL_VAR).or(file.llm.base_url) {
            llm = llm.with_base_url(base_url);
        }
        if let Some(model) = env(MODEL_VAR).or(file.llm.model) {
            llm = llm.with_model(model);
        }
        if let Some(max_tokens) = file.llm.max_tokens {
            llm = llm.with_max_tokens(max_tokens);
        }
        if let Some(secs) = file.llm.request_timeout_secs {
            llm = llm.with_request_timeout(Duration::from_secs(secs));
        }

        let mut orchestrator = OrchestratorConfig::default();
        let p = file.pipeline;
        if let Some(secs) = p.stage_timeout_secs {
            orchestrator.stage_timeout = Duration::from_secs(secs);
        }
        let mut retry: RetrySchedule = orchestrator.retry;
        if let Some(n) = p.max_retries {
            retry = retry.with_max_retries(n);
        }
        if let Some(ms) = p.initial_backoff_ms {
            retry = retry.with_initial_backoff(Duration::from_millis(ms));
        }
        if let Some(ms) = p.max_backoff_ms {
            retry = retry.with_max_backoff(Duration::from_millis(ms));
        }
        orchestrator.retry = retry;

        let config = Self { llm, orchestrator };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if !(self.llm.base_url.starts_with("http://") || self.llm.base_url.starts_with("https://"))
        {
            return invalid("llm.base_url must be an http(s) URL");
        }
        if self.llm.model.trim().is_empty() {
            return invalid("llm.model must not be empty");
        }
        if self.llm.max_tokens == 0 {
            return invalid("llm.max_tokens must be positive");
        }
        if self.llm.request_timeout.is_zero() {
            return invalid("llm.request_timeout_secs must be positive");
        }
        if self.orchestrator.stage_timeout.is_zero() {
            return invalid("pipeline.stage_timeout_secs must be positive");
        }
        let retry = &self.orchestrator.retry;
        if retry.max_backoff < retry.initial_backoff {
            return invalid("pipeline.max_backoff_ms must not be below initial_backoff_ms");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_key(key: &str) -> Option<String> {
        (key == API_KEY_VAR).then(|| "sk-test".to_string())
    }

    #[test]
    fn defaults_apply_without_file() {
        let config = AppConfig::resolve(FileConfig::default(), env_with_key).unwrap();
        assert_eq!(config.llm.model, llm::DEFAULT_MODEL);
        assert_eq!(config.llm.base_url, llm::DEFAULT_BASE_URL);
        assert_eq!(config.orchestrator.retry.max_retries, 2);
    }

    #[test]
    fn api_key_is_required() {
        let err = AppConfig::resolve(FileConfig::default(), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(API_KEY_VAR)));
    }

    #[test]
    fn file_values_and_env_overrides() {
        let file: FileConfig = toml::from_str(
            r#"
            [llm]
            model = "from-file"
            max_tokens = 1200

            [pipeline]
            max_retries = 4
            stage_timeout_secs = 30
            "#,
        )
        .unwrap();
        let config = AppConfig::resolve(file, |key| match key {
            API_KEY_VAR => Some("sk-test".into()),
            MODEL_VAR => Some("from-env".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.llm.max_tokens, 1200);
        assert_eq!(config.orchestrator.retry.max_retries, 4);
        assert_eq!(config.orchestrator.stage_timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(toml::from_str::<FileConfig>("[llm]\nmodle = \"typo\"").is_err());

        let file: FileConfig = toml::from_str("[pipeline]\nstage_timeout_secs = 0").unwrap();
        assert!(matches!(
            AppConfig::resolve(file, env_with_key),
            Err(ConfigError::Invalid(_))
        ));

        let file: FileConfig = toml::from_str("[llm]\nbase_url = \"ftp://x\"").unwrap();
        assert!(AppConfig::resolve(file, env_with_key).is_err());
    }
}
