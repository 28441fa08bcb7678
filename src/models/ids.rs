use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a stored feedback record by its storage backend.
///
/// Backends disagree on id shape (SQLite row ids, sequential counters,
/// document-store keys), so the id is carried as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(String);

impl FeedbackId {
    /// Creates a new feedback ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying ID value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for FeedbackId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_id_from_integer() {
        let id = FeedbackId::from(42);
        assert_eq!(id.as_str(), "42");
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn feedback_id_serializes_transparently() {
        let id = FeedbackId::new("abc-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc-1""#);
    }
}
