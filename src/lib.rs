//! Feedback analysis: classify free-text user feedback against a fixed
//! taxonomy with a chat-completion model, persist the results and summarize
//! recurring issues.
//!
//! The pipeline runs [`ingest`] (CSV, Excel, JSON or text files into
//! [`FeedbackRow`]s), then a [`FeedbackProcessor`]. The processor batches rows
//! through the [`BatchClassifier`] and saves each record to a
//! [`FeedbackStore`]. [`Aggregator`] turns stored records into a
//! [`FeedbackSummary`].
//!
//! Classification never fails a whole run: items the model could not handle
//! come back in the `Error` category with a reason in their summary.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod processor;
pub mod storage;
pub mod taxonomy;

pub use aggregator::{Aggregator, FeedbackSummary, IssueCounts};
pub use classifier::{BatchClassifier, ResponseValidator};
pub use config::Config;
pub use models::{
    ClassificationResult, FeedbackId, FeedbackItem, FeedbackRow, ProcessedFeedback, Sentiment,
    StoredFeedback,
};
pub use processor::{BatchConfig, FeedbackProcessor, FeedbackProcessorBuilder};
pub use storage::{FeedbackStore, MemoryStore, SqliteStore, StorageError, open_store};
pub use taxonomy::TAXONOMY;
