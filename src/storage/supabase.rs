use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use super::{FeedbackStore, StorageError, StoreState};
use crate::config::ConfigError;
use crate::models::{FeedbackId, ProcessedFeedback, StoredFeedback};

/// Store backed by a Supabase table through its PostgREST API.
pub struct SupabaseStore {
    client: Client,
    table_url: String,
    api_key: String,
    state: StoreState,
}

impl SupabaseStore {
    /// Creates a store for `table` in the project at `url`.
    ///
    /// No request is made until [`initialize`](FeedbackStore::initialize).
    pub fn new(url: &str, api_key: &str, table: &str) -> Result<Self, StorageError> {
        let base = url.trim_end_matches('/');
        reqwest::Url::parse(base).map_err(|e| ConfigError::Invalid {
            key: crate::config::SUPABASE_URL_VAR,
            value: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            table_url: format!("{base}/rest/v1/{table}"),
            api_key: api_key.to_string(),
            state: StoreState::Uninitialized,
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select(&self, query: &[(&str, &str)]) -> Result<Vec<StoredFeedback>, StorageError> {
        let response = self
            .authorized(self.client.get(&self.table_url))
            .query(query)
            .send()?;
        let rows: Vec<Value> = check_status(response)?.json()?;
        rows.into_iter().map(parse_row).collect()
    }
}

impl FeedbackStore for SupabaseStore {
    fn initialize(&mut self) -> Result<(), StorageError> {
        if self.state == StoreState::Closed {
            return Err(StorageError::Closed);
        }
        let response = self
            .authorized(self.client.get(&self.table_url))
            .query(&[("select", "id"), ("limit", "1")])
            .send()?;
        check_status(response)?;
        self.state = StoreState::Open;
        Ok(())
    }

    fn save(&mut self, feedback: &ProcessedFeedback) -> Result<FeedbackId, StorageError> {
        self.state.ensure_open()?;
        let response = self
            .authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .json(feedback)
            .send()?;
        let rows: Vec<Value> = check_status(response)?.json()?;

        let id = rows
            .first()
            .and_then(|row| row.get("id"))
            .and_then(id_of)
            .ok_or(StorageError::MissingId)?;
        debug!(%id, "saved feedback");
        Ok(id)
    }

    fn get_by_id(&self, id: &FeedbackId) -> Result<Option<StoredFeedback>, StorageError> {
        self.state.ensure_open()?;
        let filter = format!("eq.{id}");
        Ok(self
            .select(&[("select", "*"), ("id", filter.as_str())])?
            .into_iter()
            .next())
    }

    fn get_all(&self) -> Result<Vec<StoredFeedback>, StorageError> {
        self.state.ensure_open()?;
        self.select(&[("select", "*"), ("order", "created_at.desc")])
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.state = StoreState::Closed;
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(StorageError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

/// PostgREST returns numeric ids for serial keys and strings for uuid keys.
fn id_of(value: &Value) -> Option<FeedbackId> {
    match value {
        Value::Number(n) => Some(FeedbackId::new(n.to_string())),
        Value::String(s) if !s.is_empty() => Some(FeedbackId::new(s.as_str())),
        _ => None,
    }
}

fn parse_row(row: Value) -> Result<StoredFeedback, StorageError> {
    let id = row.get("id").and_then(id_of).ok_or(StorageError::MissingId)?;
    let feedback: ProcessedFeedback = serde_json::from_value(row)?;
    Ok(StoredFeedback { id, feedback })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use serde_json::json;

    fn row(id: Value) -> Value {
        json!({
            "id": id,
            "email": "",
            "original_feedback": "Too many ads",
            "sentiment": "negative",
            "category": "App Experience",
            "subcategory": "Content",
            "details": ["ads"],
            "summary": "User dislikes the number of ads",
            "created_at": "2024-06-01T10:00:00Z"
        })
    }

    #[test]
    fn new_builds_table_url() {
        let store = SupabaseStore::new("https://proj.supabase.co/", "anon", "processed_feedback")
            .unwrap();
        assert_eq!(
            store.table_url(),
            "https://proj.supabase.co/rest/v1/processed_feedback"
        );
    }

    #[test]
    fn new_rejects_invalid_url() {
        let result = SupabaseStore::new("not a url", "anon", "t");
        assert!(matches!(
            result,
            Err(StorageError::Config(ConfigError::Invalid { .. }))
        ));
    }

    #[test]
    fn operations_require_initialize() {
        let store = SupabaseStore::new("https://proj.supabase.co", "anon", "t").unwrap();
        assert!(matches!(store.get_all(), Err(StorageError::NotInitialized)));
    }

    #[test]
    fn operations_after_close_fail() {
        let mut store = SupabaseStore::new("https://proj.supabase.co", "anon", "t").unwrap();
        store.close().unwrap();
        assert!(matches!(
            store.get_by_id(&FeedbackId::from(1)),
            Err(StorageError::Closed)
        ));
        assert!(matches!(store.initialize(), Err(StorageError::Closed)));
    }

    #[test]
    fn parse_row_with_numeric_id() {
        let stored = parse_row(row(json!(17))).unwrap();
        assert_eq!(stored.id.as_str(), "17");
        assert_eq!(stored.feedback.classification.sentiment(), Sentiment::Negative);
        assert_eq!(stored.feedback.subcategory(), "Content");
    }

    #[test]
    fn parse_row_with_uuid_id() {
        let stored = parse_row(row(json!("7f1c-uuid"))).unwrap();
        assert_eq!(stored.id.as_str(), "7f1c-uuid");
    }

    #[test]
    fn parse_row_without_id_fails() {
        let mut value = row(json!(1));
        value.as_object_mut().unwrap().remove("id");
        assert!(matches!(parse_row(value), Err(StorageError::MissingId)));
    }
}
