//! Frequency counts over classified feedback.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{ClassificationResult, ProcessedFeedback, Sentiment};

/// Number of detail tags reported in a [`FeedbackSummary`].
pub const TOP_DETAILS: usize = 10;

/// Category → subcategory → count.
///
/// Error results are never recorded. Derived data only; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IssueCounts(BTreeMap<String, BTreeMap<String, usize>>);

impl IssueCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one result. Returns `false` (and counts nothing) for error results.
    pub fn record(&mut self, result: &ClassificationResult) -> bool {
        if result.is_error() {
            return false;
        }
        *self
            .0
            .entry(result.category().to_string())
            .or_default()
            .entry(result.subcategory().to_string())
            .or_default() += 1;
        true
    }

    pub fn get(&self, category: &str, subcategory: &str) -> usize {
        self.0
            .get(category)
            .and_then(|subs| subs.get(subcategory))
            .copied()
            .unwrap_or(0)
    }

    /// Sum over all subcategories of `category`.
    pub fn total_for(&self, category: &str) -> usize {
        self.0
            .get(category)
            .map(|subs| subs.values().sum())
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.keys().map(|c| self.total_for(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn subcategories(&self, category: &str) -> Option<&BTreeMap<String, usize>> {
        self.0.get(category)
    }

    /// Categories with their totals, most frequent first; ties by name.
    pub fn ranked_categories(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<_> = self
            .0
            .keys()
            .map(|c| (c.as_str(), self.total_for(c)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Dashboard-style overview of a set of processed records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackSummary {
    pub total: usize,
    pub errors: usize,
    pub sentiments: BTreeMap<Sentiment, usize>,
    pub issues: IssueCounts,
    /// Most frequent detail tags, most frequent first; ties by tag.
    pub top_details: Vec<(String, usize)>,
}

pub struct Aggregator;

impl Aggregator {
    /// Summarizes already-classified records without calling the model.
    ///
    /// Error rows count towards `total` and `errors` only.
    pub fn summarize(records: &[ProcessedFeedback]) -> FeedbackSummary {
        let mut summary = FeedbackSummary {
            total: records.len(),
            ..FeedbackSummary::default()
        };
        let mut details: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let classification = &record.classification;
            if !summary.issues.record(classification) {
                summary.errors += 1;
                continue;
            }
            *summary
                .sentiments
                .entry(classification.sentiment())
                .or_default() += 1;
            for tag in classification.details() {
                *details.entry(tag.as_str()).or_default() += 1;
            }
        }

        let mut top: Vec<(String, usize)> = details
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(TOP_DETAILS);
        summary.top_details = top;

        summary
    }
}
