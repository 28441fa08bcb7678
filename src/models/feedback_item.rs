use serde::{Deserialize, Serialize};

/// One row of uploaded input, before it is turned into a [`FeedbackItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub feedback: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl FeedbackRow {
    pub fn new(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A single piece of feedback awaiting classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackItem {
    text: String,
    email: String,
}

impl FeedbackItem {
    pub fn new(text: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            email: email.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Submitter email, empty when the row had none.
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<&FeedbackRow> for FeedbackItem {
    fn from(row: &FeedbackRow) -> Self {
        Self::new(row.feedback.clone(), row.email.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_from_row_defaults_email_to_empty() {
        let item = FeedbackItem::from(&FeedbackRow::new("Great app!"));
        assert_eq!(item.text(), "Great app!");
        assert_eq!(item.email(), "");
    }

    #[test]
    fn item_from_row_keeps_email() {
        let row = FeedbackRow::new("Crashes on login").with_email("a@example.com");
        let item = FeedbackItem::from(&row);
        assert_eq!(item.email(), "a@example.com");
    }

    #[test]
    fn row_deserializes_without_email() {
        let row: FeedbackRow = serde_json::from_str(r#"{"feedback": "ok"}"#).unwrap();
        assert_eq!(row, FeedbackRow::new("ok"));
    }
}
