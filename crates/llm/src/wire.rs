//! Request/response bodies for the OpenAI-compatible chat-completions API and
//! the mapping of provider failures onto [`GenerationError`].

use std::time::Duration;

use pipeline::{GenerationError, GenerationRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: std::borrow::Cow<'a, str>,
}

impl<'a> ChatRequest<'a> {
    /// System persona, then prior findings (if any), then the stage prompt.
    pub fn build(
        model: &'a str,
        max_tokens: u32,
        system_prompt: &'a str,
        request: &'a GenerationRequest,
    ) -> Self {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: system_prompt.into(),
        }];
        if let Some(context) = &request.context {
            messages.push(ChatMessage {
                role: "user",
                content: format!("Findings from earlier analysis steps:\n\n{context}").into(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.as_str().into(),
        });
        Self {
            model,
            messages,
            max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Option<ResponseMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
}

/// Extracts the generated text from a successful response body.
pub(crate) fn completion_text(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Unavailable {
            detail: format!("undecodable completion body: {e}"),
            retry_after: None,
        })?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Unavailable {
            detail: "completion contained no choices".to_string(),
            retry_after: None,
        })?;
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(GenerationError::Refused {
            detail: "completion stopped by content filter".to_string(),
        });
    }
    Ok(choice
        .message
        .and_then(|m| m.content)
        .unwrap_or_default())
}

/// Classifies a non-success HTTP status.
pub(crate) fn status_error(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> GenerationError {
    let detail = format!("HTTP {status}: {}", truncate(body, 300));
    match status {
        408 | 500..=599 => GenerationError::Unavailable {
            detail,
            retry_after,
        },
        _ => GenerationError::Refused { detail },
    }
}

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => &s[..cut],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::StageId;

    #[test]
    fn request_orders_system_context_prompt() {
        let request = GenerationRequest {
            stage: StageId::ContentStrategyAnalysis,
            prompt: "Analyse content".into(),
            context: Some("### Platform Identification\nInstagram".into()),
        };
        let body = serde_json::to_value(ChatRequest::build("m", 100, "persona", &request)).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[1]["content"].as_str().unwrap().contains("Instagram"));
        assert_eq!(messages[2]["content"], "Analyse content");
        assert_eq!(body["max_tokens"], 100);
    }

    #[test]
    fn request_without_context_has_two_messages() {
        let request = GenerationRequest {
            stage: StageId::PlatformIdentification,
            prompt: "p".into(),
            context: None,
        };
        assert_eq!(ChatRequest::build("m", 1, "s", &request).messages.len(), 2);
    }

    #[test]
    fn extracts_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"},"finish_reason":"stop"}]}"#;
        assert_eq!(completion_text(body).unwrap(), "hello");
    }

    #[test]
    fn content_filter_is_refusal() {
        let body = r#"{"choices":[{"message":{"content":""},"finish_reason":"content_filter"}]}"#;
        assert!(matches!(
            completion_text(body),
            Err(GenerationError::Refused { .. })
        ));
    }

    #[test]
    fn empty_choices_and_garbage_are_unavailable() {
        assert!(matches!(
            completion_text(r#"{"choices":[]}"#),
            Err(GenerationError::Unavailable { .. })
        ));
        assert!(matches!(
            completion_text("<html>bad gateway</html>"),
            Err(GenerationError::Unavailable { .. })
        ));
    }

    #[test]
    fn missing_content_becomes_empty_text() {
        let body = r#"{"choices":[{"message":{"content":null},"finish_reason":"stop"}]}"#;
        assert_eq!(completion_text(body).unwrap(), "");
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            status_error(429, "slow down", None),
            GenerationError::Refused { .. }
        ));
        assert!(matches!(
            status_error(401, "bad key", None),
            GenerationError::Refused { .. }
        ));
        let hint = Some(Duration::from_secs(2));
        assert_eq!(
            status_error(503, "", hint),
            GenerationError::Unavailable {
                detail: "HTTP 503: ".into(),
                retry_after: hint,
            }
        );
        assert!(matches!(
            status_error(408, "", None),
            GenerationError::Unavailable { .. }
        ));
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after(" 7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
