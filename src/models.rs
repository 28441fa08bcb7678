mod classification;
mod feedback_item;
mod ids;
mod processed_feedback;
mod sentiment;

pub use classification::{
    ClassificationResult, ERROR_DETAIL, PROCESSING_ERROR, STORAGE_ERROR, VALIDATION_ERROR,
};
pub use feedback_item::{FeedbackItem, FeedbackRow};
pub use ids::FeedbackId;
pub use processed_feedback::{ProcessedFeedback, StoredFeedback};
pub use sentiment::Sentiment;
