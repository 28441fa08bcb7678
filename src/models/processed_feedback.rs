use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{ClassificationResult, FeedbackId, FeedbackItem};

/// A classified piece of feedback, the unit of storage and display.
///
/// Combines the original input, the classification and the time it was
/// persisted. Serialises to the flat record shape every storage backend uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFeedback {
    pub email: String,
    pub original_feedback: String,
    #[serde(flatten)]
    pub classification: ClassificationResult,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ProcessedFeedback {
    /// Pairs an item with its classification, stamped with the current time.
    pub fn new(item: &FeedbackItem, classification: ClassificationResult) -> Self {
        Self::at(item, classification, OffsetDateTime::now_utc())
    }

    pub fn at(
        item: &FeedbackItem,
        classification: ClassificationResult,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            email: item.email().to_string(),
            original_feedback: item.text().to_string(),
            classification,
            created_at,
        }
    }

    pub fn category(&self) -> &str {
        self.classification.category()
    }

    pub fn subcategory(&self) -> &str {
        self.classification.subcategory()
    }

    pub fn summary(&self) -> &str {
        self.classification.summary()
    }

    pub fn is_error(&self) -> bool {
        self.classification.is_error()
    }
}

/// A persisted record together with the id its backend assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFeedback {
    pub id: FeedbackId,
    #[serde(flatten)]
    pub feedback: ProcessedFeedback,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    fn sample() -> ProcessedFeedback {
        let item = FeedbackItem::new("App keeps crashing", "user@example.com");
        let classification = ClassificationResult::new(
            Sentiment::Negative,
            "Bug & Issues",
            "Functional Bugs",
            vec!["crash".to_string()],
            "App crashes repeatedly",
        );
        ProcessedFeedback::new(&item, classification)
    }

    #[test]
    fn carries_item_fields() {
        let feedback = sample();
        assert_eq!(feedback.email, "user@example.com");
        assert_eq!(feedback.original_feedback, "App keeps crashing");
        assert_eq!(feedback.category(), "Bug & Issues");
        assert!(!feedback.is_error());
    }

    #[test]
    fn serializes_as_flat_record() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["email"], "user@example.com");
        assert_eq!(json["subcategory"], "Functional Bugs");
        assert!(json["created_at"].as_str().unwrap().contains('T'));
        assert!(json.get("classification").is_none());
    }

    #[test]
    fn deserializes_from_flat_record() {
        let original = sample();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: ProcessedFeedback = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.classification, original.classification);
        assert_eq!(
            parsed.created_at.unix_timestamp(),
            original.created_at.unix_timestamp()
        );
    }

    #[test]
    fn stored_feedback_ignores_unknown_columns() {
        let json = serde_json::json!({
            "id": "7",
            "email": "",
            "original_feedback": "Nice",
            "sentiment": "positive",
            "category": "User Satisfaction",
            "subcategory": "Positive Feedback",
            "details": ["praise"],
            "summary": "User is happy with the app",
            "created_at": "2024-05-01T12:00:00Z",
            "inserted_by": "import"
        });
        let stored: StoredFeedback = serde_json::from_value(json).unwrap();
        assert_eq!(stored.id.as_str(), "7");
        assert_eq!(stored.feedback.category(), "User Satisfaction");
    }
}
