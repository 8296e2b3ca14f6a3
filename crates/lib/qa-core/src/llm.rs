//! Chat-completion client for `OpenAI`-compatible endpoints (`OpenAI`, vLLM,
//! Ollama, `LocalAI`).

use std::error::Error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug)]
pub enum ModelCallError {
    Network(reqwest::Error),
    Timeout(reqwest::Error),
    Auth { status: u16, message: String },
    Http { status: u16, message: String },
    MalformedResponse(String),
}

impl fmt::Display for ModelCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(err) => write!(f, "network error: {err}"),
            Self::Timeout(err) => write!(f, "model request timed out: {err}"),
            Self::Auth { status, message } => {
                write!(f, "authentication failed (status {status}): {message}")
            }
            Self::Http { status, message } => write!(f, "HTTP error: status {status}: {message}"),
            Self::MalformedResponse(message) => write!(f, "malformed model response: {message}"),
        }
    }
}

impl Error for ModelCallError {}

impl From<reqwest::Error> for ModelCallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

/// A language model that answers one prompt at a time.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends `prompt` as a single user message and returns the reply text.
    ///
    /// # Errors
    /// Returns `ModelCallError` on transport, authentication, HTTP, or
    /// response-shape failures.
    async fn complete(&self, prompt: &str) -> Result<String, ModelCallError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for `POST {api_base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    /// Builds a client from the run configuration.
    ///
    /// # Errors
    /// Returns `ModelCallError::Network` if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ModelCallError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout)
            .build()
            .map_err(ModelCallError::Network)?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&config.api_base),
            api_key: Some(config.api_key.clone()).filter(|key| !key.is_empty()),
            model: config.model_name.clone(),
            temperature: config.temperature,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelCallError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending chat completion request"
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(error_for_status(status, &text));
        }

        parse_completion(&text)
    }
}

fn chat_endpoint(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

fn error_for_status(status: StatusCode, body: &str) -> ModelCallError {
    let message = serde_json::from_str::<ErrorResponse>(body).map_or_else(
        |_| body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
        |parsed| parsed.error.message,
    );
    let status = status.as_u16();
    match status {
        401 | 403 => ModelCallError::Auth { status, message },
        _ => ModelCallError::Http { status, message },
    }
}

fn parse_completion(body: &str) -> Result<String, ModelCallError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|err| ModelCallError::MalformedResponse(err.to_string()))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelCallError::MalformedResponse("response has no choices".to_string()))?;
    choice.message.content.ok_or_else(|| {
        ModelCallError::MalformedResponse("first choice has no message content".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            chat_endpoint("http://localhost:8000/v1/"),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            chat_endpoint("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"id":"x","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"4"},"finish_reason":"stop"}]}"#;

        assert_eq!(parse_completion(body).expect("should parse"), "4");
    }

    #[test]
    fn empty_choices_are_malformed() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();

        assert!(matches!(err, ModelCallError::MalformedResponse(_)));
    }

    #[test]
    fn null_content_is_malformed() {
        let err =
            parse_completion(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap_err();

        assert!(matches!(err, ModelCallError::MalformedResponse(_)));
    }

    #[test]
    fn unauthorized_maps_to_auth_error() {
        let err = error_for_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );

        match err {
            ModelCallError::Auth { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected auth error, got {other}"),
        }
    }

    #[test]
    fn plain_text_error_body_is_kept() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, "upstream down");

        assert!(matches!(
            err,
            ModelCallError::Http { status: 502, ref message } if message == "upstream down"
        ));
    }
}
