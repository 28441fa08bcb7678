//! Coerces raw model output into the closed taxonomy.

use serde_json::Value;
use thiserror::Error;

use super::normalizer::DetailNormalizer;
use crate::models::{ClassificationResult, ERROR_DETAIL, PROCESSING_ERROR, Sentiment};
use crate::taxonomy::{ERROR_CATEGORY, TAXONOMY};

pub const MIN_SUMMARY_CHARS: usize = 10;
pub const MAX_SUMMARY_CHARS: usize = 200;

/// Reasons a single classified element is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing or non-string field '{0}'")]
    MissingField(&'static str),

    #[error("category '{0}' is not in the taxonomy")]
    TaxonomyViolation(String),

    #[error("summary must be 10-200 characters, got {0}")]
    InvalidSummary(usize),
}

/// Validates and normalizes one element of a model response.
///
/// Sentiment never fails (unknown values become neutral). Category must resolve
/// to a taxonomy key, directly or through an alias. Subcategory and details fall
/// back to category defaults instead of failing. Summary must be 10-200
/// characters once trimmed and stripped of trailing periods.
///
/// Validation is idempotent: re-validating a serialized valid result yields the
/// same result.
///
/// # Examples
///
/// ```
/// use feda::classifier::ResponseValidator;
/// use feda::Sentiment;
///
/// let raw = serde_json::json!({
///     "sentiment": "bad",
///     "category": "Bug",
///     "subcategory": "crash",
///     "details": [],
///     "summary": "App crashes when opening settings."
/// });
/// let result = ResponseValidator::validate(&raw).unwrap();
///
/// assert_eq!(result.sentiment(), Sentiment::Negative);
/// assert_eq!(result.category(), "Bug & Issues");
/// assert_eq!(result.subcategory(), "Functional Bugs");
/// assert_eq!(result.details(), ["crash"]);
/// assert_eq!(result.summary(), "App crashes when opening settings");
/// ```
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn validate(raw: &Value) -> Result<ClassificationResult, ValidationError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(json_kind(raw)))?;

        let sentiment = obj
            .get("sentiment")
            .and_then(Value::as_str)
            .map(Sentiment::normalize)
            .unwrap_or(Sentiment::Neutral);

        let raw_category = obj
            .get("category")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingField("category"))?
            .trim();
        let raw_subcategory = obj
            .get("subcategory")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        let raw_details = details_of(obj.get("details"));
        let raw_summary = obj
            .get("summary")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingField("summary"))?;

        if raw_category == ERROR_CATEGORY {
            return Ok(error_passthrough(
                sentiment,
                raw_subcategory,
                raw_details,
                raw_summary,
            ));
        }

        let category = TAXONOMY
            .resolve_category(raw_category)
            .ok_or_else(|| ValidationError::TaxonomyViolation(raw_category.to_string()))?;

        let subcategory = category
            .subcategory(raw_subcategory)
            .or_else(|| {
                category.subcategory_for_tag(&DetailNormalizer::normalize_detail(raw_subcategory))
            })
            .unwrap_or_else(|| category.fallback_subcategory());

        let mut details = DetailNormalizer::normalize_details(raw_details);
        if details.is_empty() {
            details.push(subcategory.default_tag().to_string());
        }

        let summary = normalize_summary(raw_summary);
        let length = summary.chars().count();
        if !(MIN_SUMMARY_CHARS..=MAX_SUMMARY_CHARS).contains(&length) {
            return Err(ValidationError::InvalidSummary(length));
        }

        Ok(ClassificationResult::new(
            sentiment,
            category.name,
            subcategory.name,
            details,
            summary,
        ))
    }
}

/// Results the model itself marked as errors keep their own wording, unless
/// the summary is out of range.
fn error_passthrough(
    sentiment: Sentiment,
    subcategory: &str,
    details: Vec<String>,
    summary: &str,
) -> ClassificationResult {
    let subcategory = if subcategory.is_empty() {
        PROCESSING_ERROR
    } else {
        subcategory
    };
    let mut details = DetailNormalizer::normalize_details(details);
    if details.is_empty() {
        details.push(ERROR_DETAIL.to_string());
    }
    let mut summary = normalize_summary(summary);
    if !(MIN_SUMMARY_CHARS..=MAX_SUMMARY_CHARS).contains(&summary.chars().count()) {
        summary = "Error processing feedback: model gave no usable summary".to_string();
    }
    ClassificationResult::new(sentiment, ERROR_CATEGORY, subcategory, details, summary)
}

/// Accepts either an array of strings or a single string.
fn details_of(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

fn normalize_summary(summary: &str) -> String {
    summary.trim().trim_end_matches('.').trim_end().to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
