//! Batch classification: many feedback texts, one model call.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::validator::ResponseValidator;
use crate::llm::{CompletionClient, LlmError, SYSTEM_PROMPT};
use crate::models::ClassificationResult;
use crate::taxonomy::TAXONOMY;

/// Prompt template for batch classification.
///
/// `{taxonomy}` is replaced with the rendered taxonomy, `{count}` with the number
/// of items and `{feedback}` with the JSON array of feedback texts.
const PROMPT_TEMPLATE: &str = r#"Classify each feedback item below. Return ONLY a JSON array with exactly {count} objects, one per feedback item, in the same order. Do not include any explanatory text.

Each object must have:
- "sentiment": exactly one of "positive", "negative", "neutral"
- "category": one of the top-level keys of the taxonomy
- "subcategory": one of the subcategory names under that category
- "details": 1 to 3 tags taken from that subcategory's tag list (lowercase with underscores)
- "summary": one clear sentence of 10 to 200 characters, without prefixes or headers

TAXONOMY:
{taxonomy}

EXAMPLE:

Input: ["Love the new dark mode!", "Checkout fails with my credit card"]
Output: [
  {"sentiment": "positive", "category": "User Satisfaction", "subcategory": "Positive Feedback", "details": ["praise"], "summary": "User likes the new dark mode"},
  {"sentiment": "negative", "category": "Bug & Issues", "subcategory": "Payment Bugs", "details": ["checkout_issue", "transaction_fail"], "summary": "Credit card checkout fails"}
]

FEEDBACK ITEMS:
{feedback}

JSON OUTPUT:"#;

/// Failures of a whole batch call.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// Builder for constructing `BatchClassifier` instances.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use feda::classifier::BatchClassifierBuilder;
/// use feda::llm::{CompletionClient, HttpChatTransportBuilder};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpChatTransportBuilder::new().build()?;
/// let classifier = BatchClassifierBuilder::new()
///     .client(CompletionClient::new(Arc::new(transport)))
///     .build();
///
/// let results = classifier.classify_batch(&["Great app!", "App keeps crashing"]);
/// assert_eq!(results.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct BatchClassifierBuilder {
    client: Option<CompletionClient>,
}

impl BatchClassifierBuilder {
    /// Creates a new `BatchClassifierBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion client used for every batch.
    pub fn client(mut self, client: CompletionClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `BatchClassifier`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> BatchClassifier {
        BatchClassifier {
            client: self.client.expect("client must be set via client() method"),
        }
    }
}

/// Classifies feedback texts in batches, one model call per batch.
///
/// The output always has the same length and order as the input. A single
/// element that fails validation becomes a `Validation Error` result; a failed
/// model call or unparseable reply turns the whole batch into
/// `Processing Error` results.
pub struct BatchClassifier {
    client: CompletionClient,
}

impl BatchClassifier {
    #[must_use]
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Classifies `texts`, degrading failures to error results.
    pub fn classify_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<ClassificationResult> {
        match self.try_classify_batch(texts) {
            Ok(results) => results,
            Err(e) => {
                error!(batch_size = texts.len(), error = %e, "batch classification failed");
                texts
                    .iter()
                    .map(|_| ClassificationResult::processing_error(&e))
                    .collect()
            }
        }
    }

    /// Classifies a single text as a batch of one.
    pub fn classify_one(&self, text: &str) -> ClassificationResult {
        self.classify_batch(&[text])
            .pop()
            .unwrap_or_else(|| ClassificationResult::processing_error("no result produced"))
    }

    /// Classifies `texts`, reporting whole-batch failures to the caller.
    ///
    /// Per-element validation failures are still absorbed into the result list.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::Llm` if the model call fails after retries and
    /// `ClassifyError::MalformedResponse` if the reply is not a JSON array.
    pub fn try_classify_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_prompt(texts)?;
        let response = self
            .client
            .complete(SYSTEM_PROMPT, &prompt, self.client.temperature())?;
        let elements = parse_response(&response)?;

        if elements.len() != texts.len() {
            warn!(
                expected = texts.len(),
                received = elements.len(),
                "model returned a different number of results than requested"
            );
        }

        let mut elements = elements.into_iter();
        let results = (0..texts.len())
            .map(|index| match elements.next() {
                Some(element) => match ResponseValidator::validate(&element) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(index, error = %e, "result failed validation");
                        ClassificationResult::validation_error(e)
                    }
                },
                None => ClassificationResult::processing_error("missing result in model response"),
            })
            .collect();

        debug!(batch_size = texts.len(), "batch classified");
        Ok(results)
    }
}

/// Builds the user prompt for one batch.
fn build_prompt<S: AsRef<str>>(texts: &[S]) -> Result<String, ClassifyError> {
    let texts: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
    let feedback = serde_json::to_string_pretty(&texts).map_err(LlmError::Serialization)?;
    let taxonomy =
        serde_json::to_string_pretty(&TAXONOMY.to_json()).map_err(LlmError::Serialization)?;

    Ok(PROMPT_TEMPLATE
        .replace("{taxonomy}", &taxonomy)
        .replace("{count}", &texts.len().to_string())
        .replace("{feedback}", &feedback))
}

/// Removes a Markdown code fence wrapping the whole response.
///
/// If the trimmed text starts with a fence, the first line is dropped, and the
/// last line too when it is a closing fence.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return "",
    };
    let body = body.trim_end();
    match body.rfind('\n') {
        Some(newline) if body[newline + 1..].trim_start().starts_with("```") => &body[..newline],
        None if body.starts_with("```") => "",
        _ => body,
    }
}

/// Parses the model reply as a JSON array.
///
/// Falls back to the outermost `[...]` span when the reply carries text around
/// the array.
fn parse_response(response: &str) -> Result<Vec<Value>, ClassifyError> {
    let body = strip_code_fence(response);

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(parse_error) => extract_array(body)
            .and_then(|span| serde_json::from_str::<Value>(span).ok())
            .ok_or_else(|| ClassifyError::MalformedResponse(parse_error.to_string()))?,
    };

    match value {
        Value::Array(elements) => Ok(elements),
        _ => Err(ClassifyError::MalformedResponse(
            "expected a JSON array of results".to_string(),
        )),
    }
}

fn extract_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}
