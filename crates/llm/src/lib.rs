//! Chat-completions infrastructure adapter.
//!
//! Implements the [`pipeline::GenerativeTextClient`] port for any
//! OpenAI-compatible `/chat/completions` endpoint. OpenRouter is the default;
//! other providers only need a different base URL and model name.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing
//! and the mapping of provider failures onto
//! [`pipeline::GenerationError`] live here. The [`pipeline`] crate sees only
//! [`pipeline::GenerativeTextClient`].
//!
//! ## Failure mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | transport timeout | `Timeout` |
//! | connection failure, HTTP 408/5xx, undecodable body, no choices | `Unavailable` |
//! | other HTTP 4xx (auth, rate limit, bad request), content filter | `Refused` |

pub mod client;
pub mod config;
mod wire;

pub use client::{ChatCompletionsClient, ClientBuildError};
pub use config::{
    ChatCompletionsConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_SYSTEM_PROMPT,
};
