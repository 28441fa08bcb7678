mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{KeywordTransport, ScriptedTransport, classifier};
use feda::storage::{FeedbackStore, MemoryStore, SqliteStore};
use feda::{Aggregator, FeedbackProcessorBuilder, FeedbackRow};
use tempfile::tempdir;

fn memory_store() -> Box<dyn FeedbackStore> {
    let mut store = MemoryStore::new();
    store.initialize().expect("memory store initializes");
    Box::new(store)
}

#[test]
fn test_total_outage_degrades_every_item() {
    let transport = Arc::new(ScriptedTransport::always_failing());
    let mut processor = FeedbackProcessorBuilder::new()
        .classifier(classifier(transport.clone()))
        .store(memory_store())
        .build();
    let rows: Vec<FeedbackRow> = ["one", "two", "three"]
        .iter()
        .map(|t| FeedbackRow::new(*t))
        .collect();

    let results = processor.process_batch(&rows);

    assert_eq!(transport.calls(), 3);
    assert_eq!(results.len(), 3);
    for (row, result) in rows.iter().zip(&results) {
        assert_eq!(result.original_feedback, row.feedback);
        assert_eq!(result.category(), "Error");
        assert_eq!(result.subcategory(), "Processing Error");
        assert_eq!(result.classification.details(), ["error_processing"]);
    }
}

#[test]
fn test_batch_size_is_clamped() {
    let low = FeedbackProcessorBuilder::new()
        .classifier(classifier(Arc::new(KeywordTransport::new())))
        .store(memory_store())
        .batch_size(5)
        .build();
    let high = FeedbackProcessorBuilder::new()
        .classifier(classifier(Arc::new(KeywordTransport::new())))
        .store(memory_store())
        .batch_size(500)
        .build();

    assert_eq!(low.batch_size(), 10);
    assert_eq!(high.batch_size(), 100);
}

#[test]
fn test_large_input_is_chunked_and_ordered() {
    let transport = Arc::new(KeywordTransport::new());
    let mut processor = FeedbackProcessorBuilder::new()
        .classifier(classifier(transport.clone()))
        .store(memory_store())
        .batch_size(20)
        .build();
    let texts: Vec<String> = (0..45)
        .map(|i| if i % 3 == 0 { format!("crash #{i}") } else { format!("nice #{i}") })
        .collect();
    let rows: Vec<FeedbackRow> = texts.iter().map(FeedbackRow::new).collect();

    let results = processor.process_batch(&rows);

    assert_eq!(transport.calls(), 3);
    assert_eq!(results.len(), 45);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.original_feedback, texts[i]);
        let expected = if i % 3 == 0 { "Bug & Issues" } else { "User Satisfaction" };
        assert_eq!(result.category(), expected);
    }
}

#[test]
fn test_analyze_common_issues_counts_at_most_input_size() {
    let transport = Arc::new(KeywordTransport::new());
    let processor = FeedbackProcessorBuilder::new()
        .classifier(classifier(transport.clone()))
        .store(memory_store())
        .build();
    let texts = ["crash", "crash again", "slow", "login fails", "love it"];

    let counts = processor.analyze_common_issues(&texts);

    assert!(counts.total() <= texts.len());
    assert_eq!(counts.total_for("Bug & Issues"), 3);
    assert_eq!(counts.get("Bug & Issues", "Authentication Bugs"), 1);
    assert_eq!(
        counts.ranked_categories().first().map(|(c, _)| *c),
        Some("Bug & Issues")
    );
}

#[test]
fn test_processed_feedback_round_trips_through_sqlite() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("feedback.db");

    {
        let mut processor = FeedbackProcessorBuilder::new()
            .classifier(classifier(Arc::new(KeywordTransport::new())))
            .store(Box::new(SqliteStore::open(&db_path)?))
            .build();
        processor.process_batch(&[
            FeedbackRow::new("App crashes on launch").with_email("a@example.com"),
            FeedbackRow::new("Please add a dark theme"),
        ]);
        processor.close()?;
    }

    let store = SqliteStore::open(&db_path)?;
    let stored = store.get_all()?;
    assert_eq!(stored.len(), 2);

    let records: Vec<_> = stored.into_iter().map(|s| s.feedback).collect();
    let summary = Aggregator::summarize(&records);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.issues.get("Bug & Issues", "Functional Bugs"), 1);
    assert_eq!(summary.issues.get("Feature Requests", "Customization"), 1);
    assert!(records.iter().any(|r| r.email == "a@example.com"));
    Ok(())
}
