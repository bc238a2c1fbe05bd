/// Ollama HTTP API client.
///
/// Talks to a local Ollama instance (default `127.0.0.1:11434`) using the
/// synchronous `ureq` HTTP client:
///
/// - `GET /api/tags` lists installed models and their sizes.
/// - `POST /api/chat` with `stream: false` runs one chat completion over the
///   whole transcript. Ollama applies each model's chat template itself.
///
/// Failures are mapped onto [`RelayError`]: no response at all is a
/// `NetworkFailure`, an `{"error": ...}` body (on any status) is a
/// `BackendError`, and a body without the expected fields is a
/// `MalformedResponse`.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatBackend, ModelInfo};
use crate::config::schema::BackendConfig;
use crate::relay::RelayError;
use crate::transcript::Turn;

/// Timeout for the health probe, independent of the chat timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Request / response types for the Ollama API
// ---------------------------------------------------------------------------

/// A single message as Ollama expects it.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

/// Response body from `POST /api/chat` (non-streaming).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatResponse {
    Error { error: String },
    Message { message: ChatResponseMessage },
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Response body from `GET /api/tags`.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Error body Ollama sends with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        // "localhost" may resolve to ::1 first while Ollama binds IPv4 only.
        format!("{}{path}", self.base_url).replace("://localhost", "://127.0.0.1")
    }

    fn fetch_tags(&self, timeout: Duration) -> Result<Vec<ModelInfo>, RelayError> {
        let resp = ureq::get(&self.endpoint("/api/tags"))
            .timeout(timeout)
            .call()
            .map_err(map_ureq_error)?;
        let body = resp
            .into_string()
            .map_err(|e| RelayError::NetworkFailure(e.to_string()))?;
        parse_tags_body(&body)
    }
}

impl ChatBackend for OllamaClient {
    fn list_models(&self) -> Result<Vec<ModelInfo>, RelayError> {
        self.fetch_tags(self.timeout)
    }

    fn chat(&self, model: &str, messages: &[Turn]) -> Result<String, RelayError> {
        let body = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|t| ChatMessage {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
            stream: false,
        };

        debug!(model, turns = messages.len(), "sending chat request");
        let resp = ureq::post(&self.endpoint("/api/chat"))
            .timeout(self.timeout)
            .send_json(&body)
            .map_err(map_ureq_error)?;
        let body = resp
            .into_string()
            .map_err(|e| RelayError::NetworkFailure(e.to_string()))?;
        parse_chat_body(&body)
    }

    fn is_healthy(&self) -> bool {
        self.fetch_tags(HEALTH_TIMEOUT).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

fn map_ureq_error(err: ureq::Error) -> RelayError {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => RelayError::BackendError(parsed.error),
                Err(_) => RelayError::BackendError(format!("HTTP {code}")),
            }
        }
        ureq::Error::Transport(t) => RelayError::NetworkFailure(t.to_string()),
    }
}

/// Extract the assistant content from a `/api/chat` response body.
pub(crate) fn parse_chat_body(body: &str) -> Result<String, RelayError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::MalformedResponse(format!("unexpected chat response: {e}")))?;

    match parsed {
        ChatResponse::Error { error } => Err(RelayError::BackendError(error)),
        ChatResponse::Message { message } if message.content.trim().is_empty() => Err(
            RelayError::MalformedResponse("backend returned an empty message".to_string()),
        ),
        ChatResponse::Message { message } => Ok(message.content),
    }
}

pub(crate) fn parse_tags_body(body: &str) -> Result<Vec<ModelInfo>, RelayError> {
    serde_json::from_str::<TagsResponse>(body)
        .map(|tags| tags.models)
        .map_err(|e| RelayError::MalformedResponse(format!("unexpected model list: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_with_message_yields_content() {
        let body = r#"{"model":"m1","message":{"role":"assistant","content":"hello there"},"done":true}"#;
        assert_eq!(parse_chat_body(body).unwrap(), "hello there");
    }

    #[test]
    fn chat_body_with_error_is_backend_error() {
        let body = r#"{"error":"model not found"}"#;
        assert_eq!(
            parse_chat_body(body),
            Err(RelayError::BackendError("model not found".to_string()))
        );
    }

    #[test]
    fn chat_body_without_content_is_malformed() {
        assert!(matches!(
            parse_chat_body(r#"{"done":true}"#),
            Err(RelayError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_chat_body(r#"{"message":{"content":"   "}}"#),
            Err(RelayError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_chat_body("<html>"),
            Err(RelayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn tags_body_keeps_optional_sizes() {
        let body = r#"{"models":[{"name":"llama3:8b","size":4661224676,"digest":"abc"},{"name":"tiny"}]}"#;
        let models = parse_tags_body(body).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].size, Some(4_661_224_676));
        assert_eq!(models[1].size, None);
    }

    #[test]
    fn tags_body_without_models_is_empty() {
        assert!(parse_tags_body("{}").unwrap().is_empty());
    }

    #[test]
    fn client_from_default_config() {
        let client = OllamaClient::from_config(&BackendConfig::default());
        assert_eq!(client.base_url, "http://127.0.0.1:11434");
        assert_eq!(client.timeout, Duration::from_millis(120_000));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let config = BackendConfig {
            ollama_url: "http://localhost:11434/".to_string(),
            ..BackendConfig::default()
        };
        let client = OllamaClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.endpoint("/api/tags"), "http://127.0.0.1:11434/api/tags");
    }

    #[test]
    fn unreachable_backend_is_network_failure() {
        let config = BackendConfig {
            ollama_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 500,
        };
        let client = OllamaClient::from_config(&config);
        assert!(matches!(
            client.list_models(),
            Err(RelayError::NetworkFailure(_))
        ));
    }
}
