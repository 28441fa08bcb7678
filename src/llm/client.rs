/// Chat-completion HTTP transport.
///
/// This module provides `HttpChatTransport` for making synchronous requests to an
/// OpenAI-compatible `/chat/completions` endpoint, along with error types and a
/// builder for configuration.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Errors that can occur when talking to the chat-completion API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The endpoint answered but the completion text was empty
    #[error("Empty response from model")]
    EmptyResponse,

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// API-specific errors (malformed envelope, provider error body)
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,
}

impl LlmError {
    /// Returns `true` for failures that cannot succeed on a second attempt.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::MissingApiKey)
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a `/chat/completions` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatRequest {
    /// A system + user request, the only shape this crate sends.
    pub fn new(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
        }
    }
}

/// A single round-trip to a chat-completion endpoint.
///
/// This trait enables mocking in unit tests. Implementations perform exactly one
/// attempt; retrying is the caller's concern.
pub trait ChatTransport: Send + Sync {
    /// Sends `request` and returns the completion text.
    fn send(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Builder for constructing `HttpChatTransport` instances.
///
/// # Examples
///
/// ```
/// use feda::llm::HttpChatTransportBuilder;
///
/// let transport = HttpChatTransportBuilder::new()
///     .base_url("https://api.groq.com/openai/v1")
///     .api_key("gsk_example")
///     .build()
///     .expect("Failed to create transport");
/// ```
#[derive(Debug, Default)]
pub struct HttpChatTransportBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpChatTransportBuilder {
    /// Creates a new `HttpChatTransportBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API root (e.g., "https://api.groq.com/openai/v1").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builds the `HttpChatTransport`.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, `FEDA_LLM_BASE_URL` is used, falling back to
    /// [`DEFAULT_BASE_URL`]. If `api_key()` was not called, `GROQ_API_KEY` is used;
    /// when neither is present the build fails with `LlmError::MissingApiKey`.
    pub fn build(self) -> Result<HttpChatTransport, LlmError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var("FEDA_LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        let api_key = match self.api_key {
            Some(key) => key,
            None => std::env::var("GROQ_API_KEY").map_err(|_| LlmError::MissingApiKey)?,
        };
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(HttpChatTransport {
            client,
            base_url,
            api_key,
        })
    }
}

/// Blocking transport for OpenAI-compatible chat-completion APIs.
pub struct HttpChatTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CompletionEnvelope {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpChatTransport {
    /// Returns the API root configured for this transport.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl ChatTransport for HttpChatTransport {
    fn send(&self, request: &ChatRequest) -> Result<String, LlmError> {
        debug!(model = %request.model, "sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(LlmError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(LlmError::from_reqwest)?;
        extract_content(&body)
    }
}

/// Pulls `choices[0].message.content` out of a completion body.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let envelope: CompletionEnvelope =
        serde_json::from_str(body).map_err(LlmError::Serialization)?;

    let choice = envelope.choices.into_iter().next().ok_or_else(|| LlmError::Api {
        message: "Missing 'choices' in API response".to_string(),
    })?;

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(LlmError::EmptyResponse),
    }
}
