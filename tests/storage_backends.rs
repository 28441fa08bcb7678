use anyhow::Result;
use feda::storage::{FeedbackStore, MemoryStore, SqliteStore, StorageError};
use feda::{ClassificationResult, FeedbackId, FeedbackItem, ProcessedFeedback, Sentiment};
use tempfile::tempdir;
use time::macros::datetime;

fn record(text: &str, day: u8) -> ProcessedFeedback {
    let created_at = datetime!(2024-01-01 9:00 UTC).replace_day(day).unwrap();
    ProcessedFeedback::at(
        &FeedbackItem::new(text, "user@example.com"),
        ClassificationResult::new(
            Sentiment::Neutral,
            "App Experience",
            "Usability",
            vec!["ease_of_use".to_string()],
            "Navigation could be simpler",
        ),
        created_at,
    )
}

fn record_at_millis(text: &str, millisecond: u16) -> ProcessedFeedback {
    let mut feedback = record(text, 1);
    feedback.created_at = datetime!(2024-01-01 9:00 UTC)
        .replace_millisecond(millisecond)
        .unwrap();
    feedback
}

/// Records saved within one second still list newest first.
fn exercise_sub_second_order(store: &mut dyn FeedbackStore) -> Result<()> {
    store.save(&record_at_millis("half", 500))?;
    store.save(&record_at_millis("later", 550))?;
    store.save(&record_at_millis("start", 0))?;

    let order: Vec<_> = store
        .get_all()?
        .into_iter()
        .map(|r| r.feedback.original_feedback)
        .collect();
    assert_eq!(order, vec!["later", "half", "start"]);
    Ok(())
}

/// The contract every backend must honour.
fn exercise(store: &mut dyn FeedbackStore) -> Result<()> {
    store.initialize()?;
    store.initialize()?;

    let first = store.save(&record("first", 1))?;
    let third = store.save(&record("third", 3))?;
    let second = store.save(&record("second", 2))?;
    assert_ne!(first, third);

    let fetched = store.get_by_id(&second)?.expect("saved record is readable");
    assert_eq!(fetched.feedback, record("second", 2));
    assert!(store.get_by_id(&FeedbackId::new("404"))?.is_none());

    let order: Vec<_> = store
        .get_all()?
        .into_iter()
        .map(|r| r.feedback.original_feedback)
        .collect();
    assert_eq!(order, vec!["third", "second", "first"]);

    store.close()?;
    assert!(matches!(store.get_all(), Err(StorageError::Closed)));
    assert!(matches!(
        store.save(&record("late", 4)),
        Err(StorageError::Closed)
    ));
    Ok(())
}

#[test]
fn test_memory_store_contract() -> Result<()> {
    exercise(&mut MemoryStore::new())
}

#[test]
fn test_sqlite_in_memory_contract() -> Result<()> {
    exercise(&mut SqliteStore::in_memory()?)
}

#[test]
fn test_sqlite_file_contract() -> Result<()> {
    let dir = tempdir()?;
    exercise(&mut SqliteStore::open(dir.path().join("feedback.db"))?)
}

#[test]
fn test_sub_second_order_across_backends() -> Result<()> {
    exercise_sub_second_order(&mut MemoryStore::new())?;
    exercise_sub_second_order(&mut SqliteStore::in_memory()?)?;

    let dir = tempdir()?;
    exercise_sub_second_order(&mut SqliteStore::open(dir.path().join("feedback.db"))?)
}
