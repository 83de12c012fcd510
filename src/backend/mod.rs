//! Client for the remote summarization backend.
//!
//! The backend speaks the OpenAI-compatible chat-completions protocol (OpenRouter in the
//! default deployment). Each call carries one segment wrapped in the configured system
//! instruction and returns the generated text untouched. Failures are classified into
//! [`BackendError`] variants so the pipeline can record them per segment; the client never
//! retries.

use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instruction placed ahead of the segment text in the user turn.
pub const USER_INSTRUCTION: &str =
    "Create a detailed, structured summary of this document following the exact format specified:";

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Errors surfaced while summarizing a single segment.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, timeout, or a broken response stream.
    #[error("Summarization backend unreachable: {0}")]
    Transport(String),
    /// Backend answered with a non-success status.
    #[error(
        "Summarization backend rejected the request with status {status}: {}",
        .message.as_deref().unwrap_or("no message")
    )]
    BackendRejected {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error message reported by the backend, when one could be read.
        message: Option<String>,
    },
    /// Success status, but the generated text could not be located in the body.
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
    /// Serialized request exceeded the configured body limit and was not sent.
    #[error("Request body of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Serialized request size.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },
}

impl BackendError {
    /// Coarse classification used in reports and API responses.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::BackendRejected { .. } => FailureKind::BackendRejected,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::PayloadTooLarge { .. } => FailureKind::PayloadTooLarge,
        }
    }
}

/// Per-segment failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`BackendError::Transport`].
    Transport,
    /// See [`BackendError::BackendRejected`].
    BackendRejected,
    /// See [`BackendError::MalformedResponse`].
    MalformedResponse,
    /// See [`BackendError::PayloadTooLarge`].
    PayloadTooLarge,
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Summarize one segment of text.
    async fn summarize(&self, segment_text: &str) -> Result<String, BackendError>;
}

/// Build the HTTP-backed client for the given configuration.
pub fn build_summarization_client(
    config: BackendConfig,
) -> Result<Box<dyn SummarizationClient>, reqwest::Error> {
    Ok(Box::new(ChatCompletionsClient::new(config)?))
}

/// Chat-completions client bound to one endpoint and prompt.
pub struct ChatCompletionsClient {
    http: Client,
    config: BackendConfig,
}

impl ChatCompletionsClient {
    /// Construct a client; the configured timeout applies to every request.
    pub fn new(config: BackendConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("fernsum/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn build_request<'a>(&'a self, segment_text: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: self.config.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{USER_INSTRUCTION}\n\n{segment_text}"),
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl SummarizationClient for ChatCompletionsClient {
    async fn summarize(&self, segment_text: &str) -> Result<String, BackendError> {
        let body = serde_json::to_vec(&self.build_request(segment_text)).map_err(|error| {
            BackendError::Transport(format!("failed to encode request body: {error}"))
        })?;
        if body.len() > self.config.max_request_bytes {
            return Err(BackendError::PayloadTooLarge {
                size: body.len(),
                limit: self.config.max_request_bytes,
            });
        }

        let mut request = self
            .http
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(referer) = &self.config.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            request = request.header("X-Title", title);
        }

        let response = request.send().await.map_err(|error| {
            BackendError::Transport(describe_transport_error(&self.config.endpoint, &error))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            tracing::debug!(status = status.as_u16(), message = ?message, "Backend rejected request");
            return Err(BackendError::BackendRejected {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(|error| {
            BackendError::Transport(describe_transport_error(&self.config.endpoint, &error))
        })?;
        parse_generated_text(&bytes)
    }
}

fn describe_transport_error(endpoint: &str, error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request to {endpoint} timed out: {error}")
    } else if error.is_connect() {
        format!("failed to connect to {endpoint}: {error}")
    } else {
        format!("request to {endpoint} failed: {error}")
    }
}

/// Locate `choices[0].message.content` without guessing at alternative layouts.
fn parse_generated_text(body: &[u8]) -> Result<String, BackendError> {
    let parsed: ChatResponse = serde_json::from_slice(body).map_err(|error| {
        BackendError::MalformedResponse(format!("failed to decode response body: {error}"))
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::MalformedResponse("response contains no choices".into()))?
        .message
        .and_then(|message| message.content)
        .ok_or_else(|| {
            BackendError::MalformedResponse("choices[0].message.content is missing".into())
        })
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"error": {"message": ..}}`, `{"error": ".."}`, and `{"message": ..}`; any other
/// non-empty body is returned as a truncated preview.
fn extract_error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidate = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("error").and_then(|v| v.as_str()))
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(message) = candidate {
            return Some(message.to_string());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(ERROR_BODY_PREVIEW_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &MockServer) -> ChatCompletionsClient {
        let mut config = BackendConfig::new(server.url("/v1/chat/completions"));
        config.model = "test-model".into();
        config.system_prompt = "Summarize plainly.".into();
        ChatCompletionsClient::new(config).expect("client")
    }

    #[tokio::test]
    async fn returns_generated_text_verbatim() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("content-type", "application/json")
                    .body_contains("\"model\":\"test-model\"")
                    .body_contains("Summarize plainly.")
                    .body_contains("The reactor was shut down.");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "  Title: Reactor\n" } }]
                }));
            })
            .await;

        let summary = client
            .summarize("The reactor was shut down.")
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "  Title: Reactor\n");
    }

    #[tokio::test]
    async fn sends_auth_and_attribution_headers() {
        let server = MockServer::start_async().await;
        let mut config = BackendConfig::new(server.url("/v1/chat/completions"));
        config.api_key = Some("secret-key".into());
        config.referer = Some("http://localhost:5173".into());
        config.title = Some("Fern Document Summarizer".into());
        let client = ChatCompletionsClient::new(config).expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer secret-key")
                    .header("http-referer", "http://localhost:5173")
                    .header("x-title", "Fern Document Summarizer");
                then.status(200)
                    .json_body(json!({ "choices": [{ "message": { "content": "ok" } }] }));
            })
            .await;

        let summary = client.summarize("text").await.expect("summary");
        mock.assert_async().await;
        assert_eq!(summary, "ok");
    }

    #[tokio::test]
    async fn classifies_error_status_with_backend_message() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(429).json_body(json!({
                    "error": { "message": "Rate limit exceeded", "code": 429 }
                }));
            })
            .await;

        let error = client.summarize("text").await.expect_err("rejected");
        match error {
            BackendError::BackendRejected { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message.as_deref(), Some("Rate limit exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn classifies_error_status_with_plain_body() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let error = client.summarize("text").await.expect_err("rejected");
        assert_eq!(error.kind(), FailureKind::BackendRejected);
        assert!(error.to_string().contains("500"));
        assert!(error.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn missing_choices_is_malformed() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({ "id": "gen-1", "object": "chat.completion" }));
            })
            .await;

        let error = client.summarize("text").await.expect_err("malformed");
        assert_eq!(error.kind(), FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn missing_content_is_malformed() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .json_body(json!({ "choices": [{ "message": { "role": "assistant" } }] }));
            })
            .await;

        let error = client.summarize("text").await.expect_err("malformed");
        assert!(matches!(error, BackendError::MalformedResponse(ref m) if m.contains("content")));
    }

    #[tokio::test]
    async fn non_json_success_body_is_malformed() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        let error = client.summarize("text").await.expect_err("malformed");
        assert_eq!(error.kind(), FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn refused_connection_is_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        drop(listener);

        let config = BackendConfig::new(format!("http://{address}/v1/chat/completions"));
        let client = ChatCompletionsClient::new(config).expect("client");

        let error = client.summarize("text").await.expect_err("transport");
        assert_eq!(error.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn timeout_is_transport_failure() {
        let server = MockServer::start_async().await;
        let mut config = BackendConfig::new(server.url("/v1/chat/completions"));
        config.timeout = Duration::from_millis(50);
        let client = ChatCompletionsClient::new(config).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "choices": [{ "message": { "content": "late" } }] }));
            })
            .await;

        let error = client.summarize("text").await.expect_err("timeout");
        assert!(matches!(error, BackendError::Transport(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn oversized_request_is_not_sent() {
        let server = MockServer::start_async().await;
        let mut config = BackendConfig::new(server.url("/v1/chat/completions"));
        config.max_request_bytes = 64;
        let client = ChatCompletionsClient::new(config).expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .json_body(json!({ "choices": [{ "message": { "content": "ok" } }] }));
            })
            .await;

        let error = client.summarize("text").await.expect_err("too large");
        assert!(matches!(error, BackendError::PayloadTooLarge { limit: 64, .. }));
        mock.assert_hits_async(0).await;
    }

    #[test]
    fn error_message_extraction_prefers_structured_fields() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"bad key"}}"#).as_deref(),
            Some("bad key")
        );
        assert_eq!(
            extract_error_message(r#"{"error":"quota"}"#).as_deref(),
            Some("quota")
        );
        assert_eq!(
            extract_error_message(r#"{"message":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(extract_error_message("   "), None);
        let long = "x".repeat(500);
        assert_eq!(
            extract_error_message(&long).map(|m| m.chars().count()),
            Some(ERROR_BODY_PREVIEW_CHARS)
        );
    }
}
