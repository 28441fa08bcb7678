//! Persistence of processed feedback.
//!
//! The processor only talks to [`FeedbackStore`]; which backend sits behind it
//! is decided once, by [`open_store`], from configuration.

mod memory;
mod schema;
mod sqlite;
mod supabase;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConfigError, StorageBackend};
use crate::models::{FeedbackId, ProcessedFeedback, StoredFeedback};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    #[error("invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("store has not been initialized")]
    NotInitialized,

    #[error("store has been closed")]
    Closed,

    #[error("store did not return an id for the saved record")]
    MissingId,
}

/// A backend that persists [`ProcessedFeedback`] records.
///
/// Writes are append-only: a record is saved once and never updated.
/// Every operation after [`close`](FeedbackStore::close) fails with
/// [`StorageError::Closed`].
pub trait FeedbackStore: Send {
    /// Establishes or validates the connection. Idempotent.
    fn initialize(&mut self) -> Result<(), StorageError>;

    /// Persists one record and returns the id the backend assigned.
    fn save(&mut self, feedback: &ProcessedFeedback) -> Result<FeedbackId, StorageError>;

    fn get_by_id(&self, id: &FeedbackId) -> Result<Option<StoredFeedback>, StorageError>;

    /// All records, newest first.
    fn get_all(&self) -> Result<Vec<StoredFeedback>, StorageError>;

    fn close(&mut self) -> Result<(), StorageError>;
}

/// Lifecycle shared by the backends that need an explicit `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum StoreState {
    #[default]
    Uninitialized,
    Open,
    Closed,
}

impl StoreState {
    pub(crate) fn ensure_open(self) -> Result<(), StorageError> {
        match self {
            Self::Open => Ok(()),
            Self::Uninitialized => Err(StorageError::NotInitialized),
            Self::Closed => Err(StorageError::Closed),
        }
    }
}

/// Opens and initializes the backend selected by `config.storage`.
///
/// # Errors
///
/// Fails if the backend cannot be reached or, for Supabase, if its
/// credentials are missing.
pub fn open_store(config: &Config) -> Result<Box<dyn FeedbackStore>, StorageError> {
    let mut store: Box<dyn FeedbackStore> = match config.storage {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::Sqlite => {
            ensure_parent_directory(&config.db_path)?;
            Box::new(SqliteStore::open(&config.db_path)?)
        }
        StorageBackend::Supabase => {
            let (url, key) = config.supabase_credentials()?;
            Box::new(SupabaseStore::new(url, key, &config.supabase_table)?)
        }
    };
    store.initialize()?;
    info!(backend = ?config.storage, "storage initialized");
    Ok(store)
}

/// Creates the parent directory of the database file if it doesn't exist.
fn ensure_parent_directory(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationResult, FeedbackItem, Sentiment};
    use tempfile::tempdir;

    fn config_with(storage: StorageBackend, db_path: &Path) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.storage = storage;
        config.db_path = db_path.to_path_buf();
        config
    }

    fn sample() -> ProcessedFeedback {
        ProcessedFeedback::new(
            &FeedbackItem::new("Love it", ""),
            ClassificationResult::new(
                Sentiment::Positive,
                "User Satisfaction",
                "Positive Feedback",
                vec!["praise".to_string()],
                "User loves the app",
            ),
        )
    }

    #[test]
    fn open_store_memory() {
        let dir = tempdir().unwrap();
        let mut store = open_store(&config_with(StorageBackend::Memory, &dir.path().join("x.db")))
            .unwrap();
        let id = store.save(&sample()).unwrap();
        assert!(store.get_by_id(&id).unwrap().is_some());
    }

    #[test]
    fn open_store_sqlite_creates_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("feedback.db");
        let mut store = open_store(&config_with(StorageBackend::Sqlite, &db_path)).unwrap();
        store.save(&sample()).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn open_store_supabase_without_credentials_fails() {
        let dir = tempdir().unwrap();
        let result = open_store(&config_with(StorageBackend::Supabase, &dir.path().join("x.db")));
        assert!(matches!(
            result,
            Err(StorageError::Config(ConfigError::Missing("SUPABASE_URL")))
        ));
    }

    #[test]
    fn store_state_transitions() {
        assert!(matches!(
            StoreState::Uninitialized.ensure_open(),
            Err(StorageError::NotInitialized)
        ));
        assert!(StoreState::Open.ensure_open().is_ok());
        assert!(matches!(
            StoreState::Closed.ensure_open(),
            Err(StorageError::Closed)
        ));
    }
}
