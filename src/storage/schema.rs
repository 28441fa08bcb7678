/// Schema for the local feedback database.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// `details` holds a JSON array of tags; `created_at` unix time in nanoseconds.
pub const INITIAL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS processed_feedback (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL DEFAULT '',
    original_feedback TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    category TEXT NOT NULL,
    subcategory TEXT NOT NULL,
    details TEXT NOT NULL DEFAULT '[]',
    summary TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Newest-first listing
CREATE INDEX IF NOT EXISTS idx_feedback_created ON processed_feedback(created_at);

-- Issue breakdowns
CREATE INDEX IF NOT EXISTS idx_feedback_category ON processed_feedback(category, subcategory);
"#;
