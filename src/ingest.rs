//! Loading uploaded feedback files into [`FeedbackRow`]s.
//!
//! The format is chosen by file extension:
//!
//! - `.csv`: header row required. The feedback column is the first one named
//!   `feedback`, `content`, `text` or `comment` (ignoring case), else the
//!   first column. An `email` column is used when present.
//! - `.xls`/`.xlsx`: the first worksheet, read like a CSV with its first row
//!   as the header.
//! - `.json`: an array of `{"feedback": ..., "email": ...}` objects or an
//!   array of strings.
//! - anything else: plain text, one feedback per non-empty line.
//!
//! Blank feedback values are dropped in every format.

use std::fs;
use std::path::Path;

use calamine::Reader;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::FeedbackRow;

/// Header names recognised as the feedback column, in order of preference.
pub const FEEDBACK_COLUMNS: &[&str] = &["feedback", "content", "text", "comment"];
pub const EMAIL_COLUMN: &str = "email";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid spreadsheet: {0}")]
    Excel(#[from] calamine::Error),

    #[error("input has no columns to read feedback from")]
    MissingFeedbackColumn,
}

/// Reads `path` and returns its feedback rows in file order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse as its
/// extension says it should.
pub fn load_rows(path: impl AsRef<Path>) -> Result<Vec<FeedbackRow>, IngestError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => parse_csv(fs::File::open(path)?)?,
        "json" => parse_json(&fs::read_to_string(path)?)?,
        "xls" | "xlsx" => parse_excel(path)?,
        _ => parse_text(&fs::read_to_string(path)?),
    };

    debug!(path = %path.display(), rows = rows.len(), "loaded feedback rows");
    Ok(rows)
}

/// Where feedback and email live in a tabular input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    feedback: usize,
    email: Option<usize>,
}

impl Columns {
    fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, IngestError> {
        if headers.is_empty() {
            return Err(IngestError::MissingFeedbackColumn);
        }
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.as_ref().trim().eq_ignore_ascii_case(name))
        };
        let feedback = FEEDBACK_COLUMNS
            .iter()
            .find_map(|name| column(name))
            .unwrap_or(0);
        let email = column(EMAIL_COLUMN).filter(|&c| c != feedback);
        Ok(Self { feedback, email })
    }

    /// Builds a row from one record, or `None` when its feedback is blank.
    fn row<'a>(&self, cell: impl Fn(usize) -> Option<&'a str>) -> Option<FeedbackRow> {
        let feedback = cell(self.feedback).map(str::trim).filter(|f| !f.is_empty())?;
        let mut row = FeedbackRow::new(feedback);
        if let Some(email) = self
            .email
            .and_then(&cell)
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            row = row.with_email(email);
        }
        Some(row)
    }
}

/// Parses CSV with a header row.
pub fn parse_csv<R: std::io::Read>(reader: R) -> Result<Vec<FeedbackRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(row) = columns.row(|c| record.get(c)) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Parses the first worksheet of an `.xls`/`.xlsx` workbook.
///
/// The first row is the header; numbers and dates are read as their
/// displayed text.
pub fn parse_excel(path: &Path) -> Result<Vec<FeedbackRow>, IngestError> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::MissingFeedbackColumn)??;

    let mut records = sheet
        .rows()
        .map(|cells| cells.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let headers = records.next().ok_or(IngestError::MissingFeedbackColumn)?;
    let columns = Columns::resolve(&headers)?;

    Ok(records
        .filter_map(|cells| columns.row(|c| cells.get(c).map(String::as_str)))
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRow {
    Text(String),
    Row(FeedbackRow),
}

/// Parses a JSON array of rows or strings.
pub fn parse_json(input: &str) -> Result<Vec<FeedbackRow>, IngestError> {
    let entries: Vec<JsonRow> = serde_json::from_str(input)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            JsonRow::Text(text) => FeedbackRow::new(text),
            JsonRow::Row(row) => row,
        })
        .filter(|row| !row.feedback.trim().is_empty())
        .map(|mut row| {
            row.feedback = row.feedback.trim().to_string();
            row
        })
        .collect())
}

/// Treats each non-empty line as one feedback.
pub fn parse_text(input: &str) -> Vec<FeedbackRow> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(FeedbackRow::new)
        .collect()
}
