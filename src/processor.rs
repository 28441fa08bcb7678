//! Orchestration: rows in, classified and persisted records out.

use tracing::{debug, error, info, warn};

use crate::aggregator::IssueCounts;
use crate::classifier::BatchClassifier;
use crate::models::{ClassificationResult, FeedbackItem, FeedbackRow, ProcessedFeedback};
use crate::storage::{FeedbackStore, StorageError};

/// Number of feedback items sent to the model per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    size: usize,
}

impl BatchConfig {
    pub const DEFAULT_SIZE: usize = 50;
    pub const MIN_SIZE: usize = 10;
    pub const MAX_SIZE: usize = 100;

    /// Clamps `size` into `[MIN_SIZE, MAX_SIZE]`.
    ///
    /// ```
    /// use feda::processor::BatchConfig;
    ///
    /// assert_eq!(BatchConfig::new(5).size(), 10);
    /// assert_eq!(BatchConfig::new(500).size(), 100);
    /// assert_eq!(BatchConfig::new(42).size(), 42);
    /// ```
    pub fn new(size: usize) -> Self {
        Self {
            size: size.clamp(Self::MIN_SIZE, Self::MAX_SIZE),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

/// Builder for constructing `FeedbackProcessor` instances.
#[derive(Default)]
pub struct FeedbackProcessorBuilder {
    classifier: Option<BatchClassifier>,
    store: Option<Box<dyn FeedbackStore>>,
    batch: BatchConfig,
}

impl FeedbackProcessorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(mut self, classifier: BatchClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Sets the store records are persisted to. It must already be initialized.
    pub fn store(mut self, store: Box<dyn FeedbackStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the chunk size; out-of-range values are clamped.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch = BatchConfig::new(size);
        self
    }

    /// Builds the `FeedbackProcessor`.
    ///
    /// # Panics
    ///
    /// Panics if `classifier()` or `store()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> FeedbackProcessor {
        FeedbackProcessor {
            classifier: self
                .classifier
                .expect("classifier must be set via classifier() method"),
            store: self.store.expect("store must be set via store() method"),
            batch: self.batch,
        }
    }
}

/// Drives classification chunk by chunk and persists every result.
///
/// Failures never abort a run: a failed model call degrades its chunk, a failed
/// save degrades its item, and every input still yields one output record.
///
/// # Examples
///
/// ```no_run
/// use feda::classifier::BatchClassifier;
/// use feda::config::Config;
/// use feda::processor::FeedbackProcessorBuilder;
/// use feda::storage::open_store;
/// use feda::FeedbackRow;
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let mut processor = FeedbackProcessorBuilder::new()
///     .classifier(BatchClassifier::new(config.completion_client()?))
///     .store(open_store(&config)?)
///     .batch_size(config.batch_size)
///     .build();
///
/// let results = processor.process_batch(&[FeedbackRow::new("Great app!")]);
/// assert_eq!(results.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct FeedbackProcessor {
    classifier: BatchClassifier,
    store: Box<dyn FeedbackStore>,
    batch: BatchConfig,
}

impl FeedbackProcessor {
    pub fn batch_size(&self) -> usize {
        self.batch.size()
    }

    pub fn store(&self) -> &dyn FeedbackStore {
        self.store.as_ref()
    }

    /// Closes the underlying store.
    pub fn close(&mut self) -> Result<(), StorageError> {
        self.store.close()
    }

    /// Classifies and persists `rows`, returning one record per row in order.
    pub fn process_batch(&mut self, rows: &[FeedbackRow]) -> Vec<ProcessedFeedback> {
        let items: Vec<FeedbackItem> = rows.iter().map(FeedbackItem::from).collect();
        let chunk_count = items.len().div_ceil(self.batch.size());
        let mut results = Vec::with_capacity(items.len());

        for (index, chunk) in items.chunks(self.batch.size()).enumerate() {
            info!(
                chunk = index + 1,
                of = chunk_count,
                items = chunk.len(),
                "classifying chunk"
            );
            let texts: Vec<&str> = chunk.iter().map(FeedbackItem::text).collect();

            let classifications = match self.classifier.try_classify_batch(&texts) {
                Ok(classifications) => classifications,
                Err(e) => {
                    error!(chunk = index + 1, error = %e, "chunk classification failed");
                    chunk
                        .iter()
                        .map(|_| ClassificationResult::processing_error(&e))
                        .collect()
                }
            };

            for (item, classification) in chunk.iter().zip(classifications) {
                results.push(self.persist(item, classification));
            }
        }

        results
    }

    fn persist(
        &mut self,
        item: &FeedbackItem,
        classification: ClassificationResult,
    ) -> ProcessedFeedback {
        let record = ProcessedFeedback::new(item, classification);
        match self.store.save(&record) {
            Ok(id) => {
                debug!(%id, category = record.category(), "stored feedback");
                record
            }
            Err(e) => {
                warn!(error = %e, "failed to store feedback");
                ProcessedFeedback::new(item, ClassificationResult::storage_error(e))
            }
        }
    }

    /// Counts issues by category and subcategory with a fresh classification pass.
    ///
    /// Nothing is persisted. A chunk whose model call fails contributes nothing;
    /// error results are not counted.
    pub fn analyze_common_issues<S: AsRef<str>>(&self, texts: &[S]) -> IssueCounts {
        let mut counts = IssueCounts::new();

        for (index, chunk) in texts.chunks(self.batch.size()).enumerate() {
            match self.classifier.try_classify_batch(chunk) {
                Ok(results) => {
                    for result in &results {
                        counts.record(result);
                    }
                }
                Err(e) => {
                    warn!(chunk = index + 1, error = %e, "skipping chunk in issue analysis");
                }
            }
        }

        counts
    }
}
