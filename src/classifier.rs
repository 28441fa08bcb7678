//! Feedback classification against the fixed taxonomy.
//!
//! Three layers, leaf first:
//!
//! - [`DetailNormalizer`] cleans up detail tags into lowercase snake_case.
//! - [`ResponseValidator`] coerces one raw model object into a
//!   [`ClassificationResult`](crate::models::ClassificationResult), or rejects it.
//! - [`BatchClassifier`] sends a whole batch of texts in one prompt, parses the
//!   returned JSON array and validates each element independently.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use feda::classifier::BatchClassifier;
//! use feda::llm::{CompletionClient, HttpChatTransportBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpChatTransportBuilder::new().build()?;
//! let classifier = BatchClassifier::new(CompletionClient::new(Arc::new(transport)));
//!
//! for result in classifier.classify_batch(&["Love it", "Login is broken"]) {
//!     println!("{} / {} / {}", result.sentiment(), result.category(), result.subcategory());
//! }
//! # Ok(())
//! # }
//! ```

mod batch;
mod normalizer;
mod validator;

pub use batch::{BatchClassifier, BatchClassifierBuilder, ClassifyError};
pub use normalizer::{DetailNormalizer, MAX_DETAILS};
pub use validator::{MAX_SUMMARY_CHARS, MIN_SUMMARY_CHARS, ResponseValidator, ValidationError};
