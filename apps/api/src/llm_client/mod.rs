/// LLM Client: the single point of entry for all language-model calls in ResumeSync.
///
/// Wraps the OpenAI chat-completions API. No other module talks to the model provider
/// directly; callers depend on the `ModelTransport` trait so tests can substitute replies.
///
/// One attempt per call. Failures are surfaced immediately.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};


const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 400;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured for the language model")]
    MissingCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned an error: {0}")]
    Refusal(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Model selection and sampling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Which model variant to call.
    pub model: String,
    /// Sampling randomness, 0.0 – 1.0. Lower is more deterministic.
    pub temperature: f32,
    /// Reply length cap.
    pub max_output_tokens: u32,
    /// Transport timeout for one completion, independent of the job-site fetch timeout.
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Sends a prompt to a language model and returns its raw textual reply.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// The OpenAI-backed transport used in production.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    settings: ModelSettings,
}

impl LlmClient {
    /// Builds a client with its own HTTP connection pool and timeout.
    pub fn new(api_key: Option<String>, settings: ModelSettings) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            settings,
        })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ModelTransport for LlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredentials)?;

        let request_body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
        };

        debug!(
            "Calling {} (prompt chars={})",
            self.settings.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        read_completion(status, &body)
    }
}

/// Interprets a chat-completions HTTP response.
///
/// Every non-success status is the call not getting through (auth, rate limit, outage).
/// Only a success body that carries an `error` or a `refusal` is the model reporting failure.
fn read_completion(status: StatusCode, body: &str) -> Result<String, LlmError> {
    if !status.is_success() {
        warn!("LLM API returned {}: {}", status, body);
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: error_body_message(body).unwrap_or_else(|| body.to_string()),
        });
    }

    if let Some(message) = error_body_message(body) {
        return Err(LlmError::Refusal(message));
    }

    let response: ChatResponse = serde_json::from_str(body)?;
    if let Some(usage) = &response.usage {
        debug!(
            "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or(LlmError::EmptyContent)?;

    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(LlmError::Refusal(refusal));
    }

    message
        .content
        .map(|text| text.trim().to_string())
        .ok_or(LlmError::EmptyContent)
}

/// The `error.message` (or `error` string) of an API error body, if it has one.
fn error_body_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        error => Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| error.to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_body_yields_trimmed_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  {\"match_score\": 70}\n"}}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;
        assert_eq!(
            read_completion(StatusCode::OK, body).unwrap(),
            "{\"match_score\": 70}"
        );
    }

    #[test]
    fn test_unauthorized_is_api_error_not_refusal() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = read_completion(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, .. }));
    }

    #[test]
    fn test_error_body_on_bad_request_is_api_error() {
        let body = r#"{"error":{"message":"This model's maximum context length is exceeded"}}"#;
        match read_completion(StatusCode::BAD_REQUEST, body).unwrap_err() {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("maximum context length"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_api_errors() {
        let cases = [
            (
                StatusCode::TOO_MANY_REQUESTS,
                r#"{"error":{"message":"Rate limit reached for gpt-4o-mini","type":"requests"}}"#,
            ),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"error":{"message":"The server had an error while processing your request."}}"#,
            ),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                r#"{"error":{"message":"The engine is currently overloaded"}}"#,
            ),
        ];
        for (status, body) in cases {
            let err = read_completion(status, body).unwrap_err();
            assert!(
                matches!(err, LlmError::Api { status: s, .. } if s == status.as_u16()),
                "{status}: {err:?}"
            );
        }
    }

    #[test]
    fn test_unparseable_error_body_is_api_error() {
        let err = read_completion(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 502, .. }));
    }

    #[test]
    fn test_error_in_success_body_is_refusal() {
        let err = read_completion(StatusCode::OK, r#"{"error":"overloaded"}"#).unwrap_err();
        assert!(matches!(err, LlmError::Refusal(ref m) if m == "overloaded"));
    }

    #[test]
    fn test_message_refusal_is_refusal() {
        let body = r#"{"choices":[{"message":{"content":null,"refusal":"I can't help with that."}}]}"#;
        let err = read_completion(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, LlmError::Refusal(ref m) if m == "I can't help with that."));
    }

    #[test]
    fn test_missing_content_is_empty_content() {
        let body = r#"{"choices":[]}"#;
        assert!(matches!(
            read_completion(StatusCode::OK, body).unwrap_err(),
            LlmError::EmptyContent
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = LlmClient::new(Some("   ".to_string()), ModelSettings::default()).unwrap();
        assert!(!client.has_credentials());
        let err = client.complete("system", "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials));
    }

    #[test]
    fn test_default_settings() {
        let settings = ModelSettings::default();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert!((settings.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.max_output_tokens, 400);
        assert_eq!(settings.request_timeout_secs, 120);
    }
}
