use serde::{Deserialize, Serialize};

use super::Sentiment;
use crate::taxonomy::ERROR_CATEGORY;

/// Subcategory of a result whose whole batch call failed.
pub const PROCESSING_ERROR: &str = "Processing Error";
/// Subcategory of a result whose own element failed validation.
pub const VALIDATION_ERROR: &str = "Validation Error";
/// Subcategory of a result whose record could not be persisted.
pub const STORAGE_ERROR: &str = "Storage Error";
/// Detail tag carried by every degraded result.
pub const ERROR_DETAIL: &str = "error_processing";

/// The model's verdict on one piece of feedback, after validation.
///
/// `category` is a taxonomy key or [`ERROR_CATEGORY`]; `subcategory` belongs to
/// that category unless the category is the error sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    sentiment: Sentiment,
    category: String,
    subcategory: String,
    details: Vec<String>,
    summary: String,
}

impl ClassificationResult {
    /// Builds a result from already-validated parts.
    ///
    /// Use [`crate::classifier::ResponseValidator`] to build one from model output.
    pub fn new(
        sentiment: Sentiment,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        details: Vec<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            sentiment,
            category: category.into(),
            subcategory: subcategory.into(),
            details,
            summary: summary.into(),
        }
    }

    /// A degraded result with the given error subcategory.
    pub fn error(subcategory: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            Sentiment::Neutral,
            ERROR_CATEGORY,
            subcategory,
            vec![ERROR_DETAIL.to_string()],
            format!("Error processing feedback: {reason}"),
        )
    }

    /// Result substituted for every item of a batch whose model call failed.
    pub fn processing_error(reason: impl std::fmt::Display) -> Self {
        Self::error(PROCESSING_ERROR, reason)
    }

    /// Result substituted for a single element that failed validation.
    pub fn validation_error(reason: impl std::fmt::Display) -> Self {
        Self::error(VALIDATION_ERROR, reason)
    }

    /// Result substituted for a record the storage backend rejected.
    pub fn storage_error(reason: impl std::fmt::Display) -> Self {
        Self::new(
            Sentiment::Neutral,
            ERROR_CATEGORY,
            STORAGE_ERROR,
            vec![ERROR_DETAIL.to_string()],
            format!("Error saving feedback: {reason}"),
        )
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn is_error(&self) -> bool {
        self.category == ERROR_CATEGORY
    }
}
