use super::{FeedbackStore, StorageError, StoreState};
use crate::models::{FeedbackId, ProcessedFeedback, StoredFeedback};

/// Process-local store with sequential ids, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredFeedback>,
    next_id: i64,
    state: StoreState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FeedbackStore for MemoryStore {
    fn initialize(&mut self) -> Result<(), StorageError> {
        if self.state == StoreState::Closed {
            return Err(StorageError::Closed);
        }
        self.state = StoreState::Open;
        Ok(())
    }

    fn save(&mut self, feedback: &ProcessedFeedback) -> Result<FeedbackId, StorageError> {
        self.state.ensure_open()?;
        self.next_id += 1;
        let id = FeedbackId::from(self.next_id);
        self.records.push(StoredFeedback {
            id: id.clone(),
            feedback: feedback.clone(),
        });
        Ok(id)
    }

    fn get_by_id(&self, id: &FeedbackId) -> Result<Option<StoredFeedback>, StorageError> {
        self.state.ensure_open()?;
        Ok(self.records.iter().find(|r| &r.id == id).cloned())
    }

    fn get_all(&self) -> Result<Vec<StoredFeedback>, StorageError> {
        self.state.ensure_open()?;
        let mut records = self.records.clone();
        // Stable sort keeps insertion order among equal timestamps; reverse makes it newest first
        records.sort_by_key(|r| r.feedback.created_at);
        records.reverse();
        Ok(records)
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.state = StoreState::Closed;
        self.records.clear();
        Ok(())
    }
}
