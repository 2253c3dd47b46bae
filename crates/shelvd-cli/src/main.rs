use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use shelvd_dedup::{
    BookRecord, DedupConfig, DedupError, DetectionSummary, DuplicateFinder, DuplicateGroup,
    FuzzyThreshold, IdentifierCoverage, JsonCatalog, load_all, remove_in_batches,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "shelvd",
    about = "Find duplicate records in a Shelvd book catalog",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting SHELVD_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a catalog for duplicate groups.
    Scan {
        /// JSON array of book records.
        catalog: PathBuf,
        /// Fuzzy title threshold in percent (70-99). Defaults to the config value.
        #[arg(long)]
        threshold: Option<u8>,
    },

    /// Show how many records carry each identifier.
    Stats { catalog: PathBuf },

    /// Remove records from a catalog.
    Remove {
        catalog: PathBuf,
        #[arg(long = "id", required = true)]
        ids: Vec<Uuid>,
        #[arg(long)]
        confirm: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Print the config file location.
    Path,
}

/// Process exit codes.
#[repr(i32)]
#[derive(Clone, Copy)]
enum ExitCode {
    NotFound = 2,
    InvalidArgs = 3,
    ConfirmRequired = 8,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing();

    let json_output = cli.json || std::env::var("SHELVD_JSON").as_deref() == Ok("1");
    let config = DedupConfig::load()?;

    match cli.command {
        Commands::Scan { catalog, threshold } => {
            let requested = match threshold {
                Some(value) => FuzzyThreshold::new(value),
                None => config.fuzzy_threshold(),
            };
            let threshold = match requested {
                Ok(threshold) => threshold,
                Err(err) => fail(
                    json_output,
                    ExitCode::InvalidArgs,
                    "invalid_threshold",
                    &err.to_string(),
                    start,
                ),
            };
            let books = open_catalog(&catalog, &config, json_output, start)?;
            let groups = DuplicateFinder::new(threshold).detect(&books);
            let summary = DetectionSummary::from_groups(&groups);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "groups": groups, "summary": summary, "threshold": threshold.value() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print!("{}", render_groups(&groups, &summary));
            }
        }

        Commands::Stats { catalog } => {
            let books = open_catalog(&catalog, &config, json_output, start)?;
            let coverage = IdentifierCoverage::of(&books);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": coverage,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!(
                    "Books: {} | ISBN-13: {} | ISBN-10: {} | OCLC: {}",
                    coverage.total, coverage.with_isbn_13, coverage.with_isbn_10, coverage.with_oclc
                );
            }
        }

        Commands::Remove { catalog, ids, confirm } => {
            if !confirm {
                fail(
                    json_output,
                    ExitCode::ConfirmRequired,
                    "confirm_required",
                    &format!("Removing {} book(s) cannot be undone. Add --confirm.", ids.len()),
                    start,
                );
            }
            ensure_catalog_exists(&catalog, json_output, start);
            let store = JsonCatalog::open(&catalog);
            let removed = remove_in_batches(&store, &ids, config.catalog.delete_batch_size)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "requested": ids.len(), "removed": removed },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Removed {removed} of {} requested book(s).", ids.len());
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::List => {
                if json_output {
                    print_json(&serde_json::json!({ "status": "ok", "data": config }))?;
                } else {
                    println!("detection.fuzzy_threshold = {}", config.detection.fuzzy_threshold);
                    println!("catalog.page_size = {}", config.catalog.page_size);
                    println!("catalog.delete_batch_size = {}", config.catalog.delete_batch_size);
                }
            }
            ConfigAction::Path => {
                let path = DedupConfig::config_path();
                if json_output {
                    print_json(&serde_json::json!({ "status": "ok", "data": { "path": path } }))?;
                } else {
                    println!("{}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SHELVD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn fail(json_output: bool, code: ExitCode, error: &str, message: &str, start: Instant) -> ! {
    if json_output {
        let dur = start.elapsed().as_millis();
        println!(
            "{}",
            serde_json::json!({"status":"error","error":error,"message":message,"meta":{"duration_ms":dur}})
        );
    } else {
        eprintln!("{message}");
    }
    std::process::exit(code as i32);
}

fn ensure_catalog_exists(path: &Path, json_output: bool, start: Instant) {
    if !path.exists() {
        fail(
            json_output,
            ExitCode::NotFound,
            "not_found",
            &format!("Catalog not found: {}", path.display()),
            start,
        );
    }
}

fn open_catalog(
    path: &Path,
    config: &DedupConfig,
    json_output: bool,
    start: Instant,
) -> Result<Vec<BookRecord>> {
    ensure_catalog_exists(path, json_output, start);
    match load_all(&JsonCatalog::open(path), config.catalog.page_size) {
        Ok(books) => {
            debug!(path = %path.display(), books = books.len(), "catalog loaded");
            Ok(books)
        }
        Err(DedupError::InvalidPageSize) => fail(
            json_output,
            ExitCode::InvalidArgs,
            "invalid_config",
            "catalog.page_size must be greater than zero",
            start,
        ),
        Err(err) => Err(err.into()),
    }
}

fn render_groups(groups: &[DuplicateGroup], summary: &DetectionSummary) -> String {
    if groups.is_empty() {
        return "No duplicates found.\n".to_string();
    }

    let mut out = format!(
        "Found {} groups with {} possible duplicate books\n",
        summary.groups, summary.books_in_groups
    );
    for group in groups {
        out.push_str(&format!(
            "\n[{}] {}  ({} books)\n",
            group.kind.display_name(),
            group.label,
            group.len()
        ));
        for book in &group.books {
            let byline = book.byline();
            let id = book.id.to_string();
            if byline.is_empty() {
                out.push_str(&format!("  {}  {}\n", &id[..8], book.title));
            } else {
                out.push_str(&format!("  {}  {}  — {byline}\n", &id[..8], book.title));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelvd_dedup::detect_duplicates;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_ids() {
        let cli = Cli::try_parse_from([
            "shelvd",
            "remove",
            "books.json",
            "--id",
            "00000000-0000-0000-0000-000000000001",
            "--id",
            "00000000-0000-0000-0000-000000000002",
            "--confirm",
        ])
        .unwrap();
        match cli.command {
            Commands::Remove { ids, confirm, .. } => {
                assert_eq!(ids.len(), 2);
                assert!(confirm);
            }
            _ => panic!("expected remove"),
        }
    }

    #[test]
    fn renders_empty_result() {
        let summary = DetectionSummary::default();
        assert_eq!(render_groups(&[], &summary), "No duplicates found.\n");
    }

    #[test]
    fn renders_groups_with_bylines() {
        let mut a = BookRecord::new(Uuid::from_u128(1), "The Hobbit");
        a.author = Some("J.R.R. Tolkien".to_string());
        let b = BookRecord::new(Uuid::from_u128(2), "Hobbit");
        let groups = detect_duplicates(&[a, b], 85).unwrap();
        let summary = DetectionSummary::from_groups(&groups);

        let text = render_groups(&groups, &summary);

        assert!(text.starts_with("Found 1 groups with 2 possible duplicate books"));
        assert!(text.contains("[Exact Title] Exact title: \"The Hobbit\""));
        assert!(text.contains("00000000  The Hobbit  — J.R.R. Tolkien"));
    }
}
