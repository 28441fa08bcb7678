use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feda::classifier::BatchClassifier;
use feda::config::{Config, ConfigError};
use feda::ingest::{self, IngestError};
use feda::llm::LlmError;
use feda::storage::{FeedbackStore, MemoryStore, StorageError, open_store};
use feda::{
    Aggregator, FeedbackId, FeedbackProcessorBuilder, FeedbackSummary, IssueCounts,
    ProcessedFeedback, StoredFeedback, TAXONOMY,
};
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// feda - classify user feedback with an LLM and keep the results
#[derive(Parser)]
#[command(name = "feda")]
#[command(about = "Feedback analysis: sentiment, category and summary for every comment")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Classify and store every feedback in a file
    Process(ProcessCommand),
    /// Count issues by category in a file without storing anything
    Issues(IssuesCommand),
    /// List stored feedback, newest first
    List(ListCommand),
    /// Show one stored feedback record as JSON
    Show(ShowCommand),
    /// Summarize stored feedback
    Stats,
    /// Print the classification taxonomy
    Taxonomy,
}

#[derive(Parser)]
struct ProcessCommand {
    /// CSV, JSON or text file with one feedback per row
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Feedback items per model call (clamped to 10-100)
    #[arg(short, long, value_name = "N")]
    batch_size: Option<usize>,

    /// Model id, overriding FEDA_MODEL
    #[arg(short, long, value_name = "ID")]
    model: Option<String>,
}

#[derive(Parser)]
struct IssuesCommand {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Feedback items per model call (clamped to 10-100)
    #[arg(short, long, value_name = "N")]
    batch_size: Option<usize>,
}

#[derive(Parser)]
struct ListCommand {
    /// Maximum number of records to show
    #[arg(short, long, value_name = "N", default_value_t = 20)]
    limit: usize,
}

#[derive(Parser)]
struct ShowCommand {
    #[arg(value_name = "ID")]
    id: String,
}

/// Failures caused by the invocation rather than by the system.
#[derive(Debug, thiserror::Error)]
enum UsageError {
    #[error("no feedback found in {0}")]
    EmptyInput(String),

    #[error("no stored feedback with id {0}")]
    NotFound(String),
}

fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Process(cmd) => handle_process(cmd),
        Commands::Issues(cmd) => handle_issues(cmd),
        Commands::List(cmd) => handle_list(cmd),
        Commands::Show(cmd) => handle_show(cmd),
        Commands::Stats => handle_stats(),
        Commands::Taxonomy => {
            print!("{}", render_taxonomy());
            Ok(())
        }
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input files, missing or invalid configuration and
/// unknown ids. Everything else (database, network) is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.is::<UsageError>()
            || cause.is::<IngestError>()
            || cause.is::<ConfigError>()
            || matches!(cause.downcast_ref::<LlmError>(), Some(e) if e.is_configuration())
            || matches!(
                cause.downcast_ref::<StorageError>(),
                Some(StorageError::Config(_))
            )
    })
}

fn handle_process(cmd: &ProcessCommand) -> Result<()> {
    let config = Config::from_env()?;
    let rows = load_input(&cmd.file)?;

    let mut client = config.completion_client()?;
    if let Some(model) = &cmd.model {
        client = client.with_model(model);
    }
    let store = open_store(&config).context("Failed to open feedback store")?;

    let mut processor = FeedbackProcessorBuilder::new()
        .classifier(BatchClassifier::new(client))
        .store(store)
        .batch_size(cmd.batch_size.unwrap_or(config.batch_size))
        .build();
    info!(rows = rows.len(), batch_size = processor.batch_size(), "processing feedback");

    let results = processor.process_batch(&rows);
    processor.close().context("Failed to close feedback store")?;

    for record in &results {
        println!("{}", render_result_line(record));
    }
    println!();
    print!("{}", render_summary(&Aggregator::summarize(&results)));
    Ok(())
}

fn handle_issues(cmd: &IssuesCommand) -> Result<()> {
    let config = Config::from_env()?;
    let rows = load_input(&cmd.file)?;
    let texts: Vec<&str> = rows.iter().map(|row| row.feedback.as_str()).collect();

    // Nothing is persisted during analysis
    let mut store = MemoryStore::new();
    store.initialize()?;

    let processor = FeedbackProcessorBuilder::new()
        .classifier(BatchClassifier::new(config.completion_client()?))
        .store(Box::new(store))
        .batch_size(cmd.batch_size.unwrap_or(config.batch_size))
        .build();

    print!("{}", render_issues(&processor.analyze_common_issues(&texts)));
    Ok(())
}

fn handle_list(cmd: &ListCommand) -> Result<()> {
    let store = open_configured_store()?;
    let records = store.get_all().context("Failed to read stored feedback")?;

    if records.is_empty() {
        println!("No feedback stored yet.");
    }
    for record in records.iter().take(cmd.limit) {
        println!("{}", render_list_line(record));
    }
    Ok(())
}

fn handle_show(cmd: &ShowCommand) -> Result<()> {
    let store = open_configured_store()?;
    let id = FeedbackId::new(cmd.id.trim());
    let record = store
        .get_by_id(&id)
        .context("Failed to read stored feedback")?
        .ok_or_else(|| UsageError::NotFound(cmd.id.clone()))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn handle_stats() -> Result<()> {
    let store = open_configured_store()?;
    let records: Vec<ProcessedFeedback> = store
        .get_all()
        .context("Failed to read stored feedback")?
        .into_iter()
        .map(|stored| stored.feedback)
        .collect();

    print!("{}", render_summary(&Aggregator::summarize(&records)));
    Ok(())
}

fn open_configured_store() -> Result<Box<dyn FeedbackStore>> {
    let config = Config::from_env()?;
    open_store(&config).context("Failed to open feedback store")
}

fn load_input(path: &Path) -> Result<Vec<feda::FeedbackRow>> {
    let rows = ingest::load_rows(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    if rows.is_empty() {
        return Err(UsageError::EmptyInput(path.display().to_string()).into());
    }
    Ok(rows)
}

fn render_result_line(record: &ProcessedFeedback) -> String {
    format!(
        "[{} / {}] {}: {}",
        record.category(),
        record.subcategory(),
        record.classification.sentiment(),
        record.summary()
    )
}

fn render_list_line(record: &StoredFeedback) -> String {
    let created = record
        .feedback
        .created_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| record.feedback.created_at.to_string());
    format!(
        "{:>6}  {}  {} / {}  {}",
        record.id.as_str(),
        created,
        record.feedback.category(),
        record.feedback.subcategory(),
        record.feedback.summary()
    )
}

fn render_summary(summary: &FeedbackSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total feedback: {}", summary.total);
    let _ = writeln!(out, "Errors: {}", summary.errors);

    let _ = writeln!(out, "Sentiment:");
    for (sentiment, count) in &summary.sentiments {
        let _ = writeln!(out, "  {sentiment}: {count}");
    }

    out.push_str(&render_issues(&summary.issues));

    if !summary.top_details.is_empty() {
        let _ = writeln!(out, "Top details:");
        for (tag, count) in &summary.top_details {
            let _ = writeln!(out, "  {tag}: {count}");
        }
    }
    out
}

fn render_issues(issues: &IssueCounts) -> String {
    let mut out = String::new();
    if issues.is_empty() {
        let _ = writeln!(out, "No issues found.");
        return out;
    }

    let _ = writeln!(out, "Issues by category:");
    for (category, total) in issues.ranked_categories() {
        let _ = writeln!(out, "  {category}: {total}");
        let mut subs: Vec<_> = issues
            .subcategories(category)
            .map(|subs| subs.iter().collect())
            .unwrap_or_default();
        subs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (subcategory, count) in subs {
            let _ = writeln!(out, "    {subcategory}: {count}");
        }
    }
    out
}

fn render_taxonomy() -> String {
    let mut out = String::new();
    for category in TAXONOMY.categories() {
        let _ = writeln!(out, "{}", category.name);
        for sub in category.subcategories {
            let _ = writeln!(out, "  {}: {}", sub.name, sub.tags.join(", "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use feda::{ClassificationResult, FeedbackItem, Sentiment};

    fn record(category: &str, subcategory: &str) -> ProcessedFeedback {
        ProcessedFeedback::new(
            &FeedbackItem::new("text", ""),
            ClassificationResult::new(
                Sentiment::Negative,
                category,
                subcategory,
                vec!["lag".to_string()],
                "Scrolling is slow",
            ),
        )
    }

    #[test]
    fn result_line_shows_classification() {
        let line = render_result_line(&record("Performance", "Speed Issues"));
        assert_eq!(line, "[Performance / Speed Issues] negative: Scrolling is slow");
    }

    #[test]
    fn issues_are_ranked() {
        let mut issues = IssueCounts::new();
        issues.record(&record("Performance", "Speed Issues").classification);
        issues.record(&record("Bug & Issues", "Functional Bugs").classification);
        issues.record(&record("Bug & Issues", "UI/UX Bugs").classification);

        let rendered = render_issues(&issues);
        let bugs = rendered.find("Bug & Issues: 2").unwrap();
        let perf = rendered.find("Performance: 1").unwrap();
        assert!(bugs < perf);
    }

    #[test]
    fn empty_issues_message() {
        assert_eq!(render_issues(&IssueCounts::new()), "No issues found.\n");
    }

    #[test]
    fn summary_lists_totals_and_details() {
        let records = vec![
            record("Performance", "Speed Issues"),
            ProcessedFeedback::new(
                &FeedbackItem::new("x", ""),
                ClassificationResult::processing_error("offline"),
            ),
        ];
        let rendered = render_summary(&Aggregator::summarize(&records));
        assert!(rendered.contains("Total feedback: 2"));
        assert!(rendered.contains("Errors: 1"));
        assert!(rendered.contains("negative: 1"));
        assert!(rendered.contains("lag: 1"));
    }

    #[test]
    fn taxonomy_lists_every_category() {
        let rendered = render_taxonomy();
        for name in TAXONOMY.category_names() {
            assert!(rendered.contains(name));
        }
        assert!(rendered.contains("  Speed Issues: slow_loading, response_time, lag, bottleneck"));
    }

    #[test]
    fn user_errors_are_classified() {
        let empty: anyhow::Error = UsageError::EmptyInput("x.csv".to_string()).into();
        assert!(is_user_error(&empty));

        let missing_key = anyhow::Error::new(LlmError::MissingApiKey).context("building client");
        assert!(is_user_error(&missing_key));

        let bad_file = anyhow::Error::new(IngestError::MissingFeedbackColumn)
            .context("Failed to load x.xlsx");
        assert!(is_user_error(&bad_file));

        let network = anyhow::Error::new(StorageError::HttpStatus {
            status: 500,
            body: String::new(),
        });
        assert!(!is_user_error(&network));
    }

    #[test]
    fn load_input_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n\n").unwrap();

        let err = load_input(&path).unwrap_err();
        assert!(is_user_error(&err));
    }
}
