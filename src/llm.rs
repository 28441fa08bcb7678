/// Chat-completion client module.
///
/// This module provides the blocking HTTP transport for OpenAI-compatible chat
/// endpoints, the retry policy wrapped around it, and the `CompletionClient`
/// the classifier talks to.
mod client;
mod completion;
mod retry;

pub use client::{
    ChatMessage, ChatRequest, ChatTransport, DEFAULT_BASE_URL, HttpChatTransport,
    HttpChatTransportBuilder, LlmError,
};
pub use completion::{CompletionClient, DEFAULT_MODEL, DEFAULT_TEMPERATURE, SYSTEM_PROMPT};
pub use retry::{RetryPolicy, retry_with_backoff};
