use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tracing::debug;

use super::schema::INITIAL_SCHEMA;
use super::{FeedbackStore, StorageError};
use crate::models::{
    ClassificationResult, FeedbackId, ProcessedFeedback, Sentiment, StoredFeedback,
};

const SELECT_COLUMNS: &str = "SELECT id, email, original_feedback, sentiment, category, \
     subcategory, details, summary, created_at FROM processed_feedback";

/// SQLite-backed store.
///
/// The schema is created when the connection opens, so a freshly opened store
/// is already usable; `initialize` re-runs the idempotent schema.
pub struct SqliteStore {
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Opens an in-memory SQLite database.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(Self { conn: Some(conn) })
    }

    fn connection(&self) -> Result<&Connection, StorageError> {
        self.conn.as_ref().ok_or(StorageError::Closed)
    }
}

impl FeedbackStore for SqliteStore {
    fn initialize(&mut self) -> Result<(), StorageError> {
        self.connection()?.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    fn save(&mut self, feedback: &ProcessedFeedback) -> Result<FeedbackId, StorageError> {
        let conn = self.connection()?;
        let classification = &feedback.classification;
        let details = serde_json::to_string(classification.details())?;
        let created_at = i64::try_from(feedback.created_at.unix_timestamp_nanos())
            .map_err(|e| StorageError::Timestamp(e.to_string()))?;

        conn.execute(
            "INSERT INTO processed_feedback \
             (email, original_feedback, sentiment, category, subcategory, details, summary, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                feedback.email,
                feedback.original_feedback,
                classification.sentiment().as_str(),
                classification.category(),
                classification.subcategory(),
                details,
                classification.summary(),
                created_at,
            ],
        )?;

        let id = FeedbackId::from(conn.last_insert_rowid());
        debug!(%id, "saved feedback");
        Ok(id)
    }

    fn get_by_id(&self, id: &FeedbackId) -> Result<Option<StoredFeedback>, StorageError> {
        let conn = self.connection()?;
        // Ids from other backends are not row ids
        let Ok(row_id) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };

        let raw = conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [row_id], RawRecord::from_row)
            .optional()?;
        raw.map(RawRecord::into_stored).transpose()
    }

    fn get_all(&self) -> Result<Vec<StoredFeedback>, StorageError> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"))?;
        let rows = stmt.query_map([], RawRecord::from_row)?;

        rows.map(|raw| raw.map_err(StorageError::from).and_then(RawRecord::into_stored))
            .collect()
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
        }
        Ok(())
    }
}

/// Column values as read, before parsing.
struct RawRecord {
    id: i64,
    email: String,
    original_feedback: String,
    sentiment: String,
    category: String,
    subcategory: String,
    details: String,
    summary: String,
    created_at: i64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            original_feedback: row.get(2)?,
            sentiment: row.get(3)?,
            category: row.get(4)?,
            subcategory: row.get(5)?,
            details: row.get(6)?,
            summary: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_stored(self) -> Result<StoredFeedback, StorageError> {
        let sentiment: Sentiment = self.sentiment.parse().map_err(StorageError::InvalidRecord)?;
        let details: Vec<String> = serde_json::from_str(&self.details)?;
        let created_at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.created_at))
            .map_err(|e| StorageError::Timestamp(e.to_string()))?;

        Ok(StoredFeedback {
            id: FeedbackId::from(self.id),
            feedback: ProcessedFeedback {
                email: self.email,
                original_feedback: self.original_feedback,
                classification: ClassificationResult::new(
                    sentiment,
                    self.category,
                    self.subcategory,
                    details,
                    self.summary,
                ),
                created_at,
            },
        })
    }
}
