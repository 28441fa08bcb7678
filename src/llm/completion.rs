//! The completion client: one templated prompt in, raw model text out.

use std::sync::Arc;

use tracing::{debug, error};

use super::{ChatRequest, ChatTransport, LlmError, RetryPolicy, retry_with_backoff};

pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a feedback analysis assistant. \
Provide responses in exact JSON format with no additional text. \
Ensure categories are specific and use only the allowed taxonomy values.";

/// Sends prompts to the model through a [`ChatTransport`], retrying failures.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use feda::llm::{CompletionClient, HttpChatTransportBuilder};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpChatTransportBuilder::new().build()?;
/// let client = CompletionClient::new(Arc::new(transport));
///
/// let text = client.complete("Reply with JSON.", "{\"ping\": true}", 0.0)?;
/// println!("{text}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn ChatTransport>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl CompletionClient {
    /// Creates a client with the default model, temperature and retry policy.
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Default sampling temperature for this client.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Sends a system + user prompt and returns the model's text.
    ///
    /// # Errors
    ///
    /// Returns the last `LlmError` once the retry budget is exhausted.
    /// A blank completion counts as a failed attempt (`LlmError::EmptyResponse`).
    pub fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(&self.model, system_prompt, user_prompt, temperature);
        debug!(model = %self.model, prompt_chars = user_prompt.len(), "requesting completion");

        retry_with_backoff(&self.retry, || {
            let text = self.transport.send(&request)?;
            if text.trim().is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            Ok(text)
        })
    }

    /// Like [`complete`](Self::complete) with the standard system prompt, but never fails.
    ///
    /// Returns `default` when every attempt fails.
    pub fn complete_safe(&self, prompt: &str, default: &str) -> String {
        match self.complete(SYSTEM_PROMPT, prompt, self.temperature) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "completion failed, using default response");
                default.to_string()
            }
        }
    }
}
