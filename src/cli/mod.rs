//! Command-line interface for casewarden.
//!
//! Provides commands for validating names, auditing and correcting CSV
//! datasets, asking questions about a dataset, and managing stored files
//! and the correction history.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::warn;

use crate::adapters::{GeminiOracle, Oracle};
use crate::config::{self, ResolvedConfig};
use crate::core::apply::ANONYMOUS_USER;
use crate::core::{
    apply_all, audit_dataset, request_freeform_answer, request_summary, AuditStamp,
    NameValidator, ReconcileMode, Reconciler,
};
use crate::domain::{CorrectionTableEntry, NAME_COLUMNS};
use crate::ingest::{parse_csv, to_csv, LoadReport};
use crate::library::{CorrectionHistory, CorrectionRecord, FileCatalog};

pub mod files;

/// casewarden - audit and correct names in case-record datasets
#[derive(Parser, Debug)]
#[command(name = "casewarden")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate one or more names
    Validate {
        /// Names to validate
        #[arg(required = true)]
        names: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Offset into the surname suggestion list
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Audit the name columns of a CSV dataset
    #[command(group(ArgGroup::new("persist").args(["output", "save"]).multiple(true)))]
    Audit {
        /// CSV file (or stored file name with --stored)
        source: String,

        /// Read the dataset from the file library instead of disk
        #[arg(long)]
        stored: bool,

        /// Ask the remote oracle for first/last name corrections
        #[arg(long)]
        remote: bool,

        /// Apply every correction to the dataset (needs --output or --save)
        #[arg(long, requires = "persist")]
        apply: bool,

        /// Ask the oracle for a written summary of the anomalies
        #[arg(long)]
        summary: bool,

        /// Write the (possibly corrected) dataset to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the (possibly corrected) dataset to the file library
        #[arg(long)]
        save: bool,

        /// Identity recorded in audit stamps
        #[arg(long, env = "CASEWARDEN_USER")]
        user: Option<String>,

        /// Print the reconciliation outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a free-form question about a dataset
    Ask {
        /// CSV file (or stored file name with --stored)
        source: String,

        /// The question
        question: String,

        /// Read the dataset from the file library instead of disk
        #[arg(long)]
        stored: bool,
    },

    /// Manage stored CSV files
    Files {
        #[command(subcommand)]
        command: files::FilesCommands,
    },

    /// Show recently applied corrections
    History {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Validate { names, json, seed } => validate_names(&names, json, seed),
            Commands::Audit {
                source,
                stored,
                remote,
                apply,
                summary,
                output,
                save,
                user,
                json,
            } => {
                let options = AuditOptions {
                    remote,
                    apply,
                    summary,
                    output,
                    save,
                    user,
                    json,
                };
                audit(config::config()?, &source, stored, options).await
            }
            Commands::Ask {
                source,
                question,
                stored,
            } => ask(config::config()?, &source, &question, stored).await,
            Commands::Files { command } => files::execute(command).await,
            Commands::History { limit } => show_history(limit).await,
            Commands::Config => show_config(),
        }
    }
}

/// Flags for the `audit` command
#[derive(Debug, Default)]
struct AuditOptions {
    remote: bool,
    apply: bool,
    summary: bool,
    output: Option<PathBuf>,
    save: bool,
    user: Option<String>,
    json: bool,
}

/// Identity used for stamps and the file library
pub(crate) fn resolve_owner(cfg: &ResolvedConfig, user: Option<&str>) -> String {
    user.or(cfg.user.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}

fn build_oracle(cfg: &ResolvedConfig) -> Result<Arc<dyn Oracle>> {
    let oracle = GeminiOracle::from_settings(&cfg.oracle, cfg.api_key.as_deref())?;
    Ok(Arc::new(oracle))
}

/// Load a dataset from disk or from the owner's file library
async fn load_dataset(
    cfg: &ResolvedConfig,
    source: &str,
    stored: bool,
    owner: &str,
) -> Result<LoadReport> {
    let (name, text) = if stored {
        let catalog = FileCatalog::load(&cfg.files_dir(), owner).await?;
        let file = catalog
            .get(source)
            .with_context(|| format!("No stored file named '{}'", source))?;
        (file.name.clone(), file.data.clone())
    } else {
        let path = Path::new(source);
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
        (file_name(path), text)
    };

    let report = parse_csv(&text, &name)?;
    for warning in &report.warnings {
        eprintln!("[warning] {}", warning);
    }
    Ok(report)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validate names and print results
fn validate_names(names: &[String], json: bool, seed: u64) -> Result<()> {
    let validator = NameValidator::with_seed(seed);
    let results = validator.validate_batch(names)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        let mark = if result.is_valid { "valid" } else { "INVALID" };
        println!(
            "{:<30} {:>3}%  {:<8} {}",
            result.name,
            result.confidence,
            mark,
            result.message.as_deref().unwrap_or("")
        );
        for suggestion in &result.suggestions {
            println!("{:<30}       -> {}", "", suggestion);
        }
    }

    Ok(())
}

fn print_table(table: &[CorrectionTableEntry]) {
    if table.is_empty() {
        println!("No corrections suggested");
        return;
    }

    println!(
        "{:>5}  {:<22} {:<22} {:<22} {}",
        "ROW", "COLUMN", "ORIGINAL", "SUGGESTED", "REASON"
    );
    println!("{}", "-".repeat(100));
    for entry in table {
        println!(
            "{:>5}  {:<22} {:<22} {:<22} {}",
            entry.row, entry.column, entry.original_value, entry.suggested_value, entry.reason
        );
    }
}

/// Audit a dataset, optionally applying and persisting corrections.
///
/// History is only written once the corrected dataset has been persisted.
async fn audit(
    cfg: &ResolvedConfig,
    source: &str,
    stored: bool,
    options: AuditOptions,
) -> Result<()> {
    if options.apply && options.output.is_none() && !options.save {
        anyhow::bail!("--apply needs --output or --save, otherwise the corrections are lost");
    }

    let owner = resolve_owner(cfg, options.user.as_deref());
    let LoadReport { mut dataset, .. } = load_dataset(cfg, source, stored, &owner).await?;

    let validator = NameValidator::new();
    let anomalies = audit_dataset(&validator, &dataset, &NAME_COLUMNS);
    eprintln!(
        "Audited {} rows of {}: {} name anomalies",
        dataset.len(),
        dataset.provenance().source_name,
        anomalies.len()
    );

    let oracle = if options.remote || options.summary {
        match build_oracle(cfg) {
            Ok(oracle) => Some(oracle),
            Err(e) => {
                warn!(error = %e, "Oracle unavailable, auditing locally");
                eprintln!("[warning] Oracle unavailable ({}), using local validation", e);
                None
            }
        }
    } else {
        None
    };

    let mut reconciler = Reconciler::new(validator);
    if options.remote {
        if let Some(oracle) = &oracle {
            reconciler = reconciler.with_oracle(Arc::clone(oracle), cfg.oracle.generation.clone());
        }
    }

    let outcome = reconciler.reconcile(&dataset, &NAME_COLUMNS).await?;
    if outcome.mode == ReconcileMode::LocalFallback {
        eprintln!("[warning] Oracle unavailable, used local validation");
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_table(&outcome.correction_table);
    }

    if options.summary {
        if let Some(oracle) = &oracle {
            let audit_text = serde_json::to_string_pretty(&anomalies)?;
            match request_summary(oracle.as_ref(), &cfg.oracle.generation, &audit_text).await {
                Ok(summary) => println!("\nSummary:\n{}", summary),
                Err(e) => eprintln!("[warning] Summary unavailable: {}", e),
            }
        }
    }

    let mut records = Vec::new();
    if options.apply && !outcome.correction_table.is_empty() {
        let stamp = AuditStamp::today(Some(&owner));
        let applied = apply_all(&mut dataset, &outcome.correction_table, &stamp)?;

        let source_name = dataset.provenance().source_name.clone();
        records = outcome
            .correction_table
            .iter()
            .filter(|e| e.row >= 1 && e.row <= dataset.len())
            .map(|e| CorrectionRecord::new(&owner, &source_name, e))
            .collect();

        eprintln!("Applied {} corrections", applied);
    }

    if let Some(path) = &options.output {
        tokio::fs::write(path, to_csv(&dataset)?)
            .await
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    if options.save {
        let mut catalog = FileCatalog::load(&cfg.files_dir(), &owner).await?;
        let name = dataset.provenance().source_name.clone();
        let text = to_csv(&dataset)?;
        let size = catalog.upsert(&name, text).size;
        dataset.set_size(size);
        catalog.save(&cfg.files_dir()).await?;
        eprintln!("Saved {} ({} bytes) to the file library", name, size);
    }

    CorrectionHistory::new(cfg.history_path()).append(&records)?;

    Ok(())
}

/// Ask a question about a dataset
async fn ask(cfg: &ResolvedConfig, source: &str, question: &str, stored: bool) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("Please enter a question");
    }

    let owner = resolve_owner(cfg, None);
    let report = load_dataset(cfg, source, stored, &owner).await?;
    if report.dataset.is_empty() {
        anyhow::bail!("No rows loaded from {}", source);
    }

    let oracle = build_oracle(cfg)?;

    eprintln!("Asking about {} rows...", report.dataset.len());
    let answer = request_freeform_answer(
        oracle.as_ref(),
        &cfg.oracle.generation,
        &cfg.retry,
        &report.dataset,
        question,
    )
    .await;

    println!("{}", answer);
    Ok(())
}

/// Show recently applied corrections
async fn show_history(limit: usize) -> Result<()> {
    let cfg = config::config()?;
    let records = CorrectionHistory::new(cfg.history_path()).replay().await?;

    if records.is_empty() {
        println!("No corrections recorded");
        return Ok(());
    }

    println!(
        "{:<20} {:<20} {:<16} {:>5}  {:<22} {}",
        "WHEN", "BY", "FILE", "ROW", "COLUMN", "CHANGE"
    );
    println!("{}", "-".repeat(110));

    for record in records.iter().rev().take(limit) {
        println!(
            "{:<20} {:<20} {:<16} {:>5}  {:<22} {} -> {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.owner,
            record.source_name,
            record.row,
            record.column,
            record.original,
            record.corrected
        );
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;
    match &cfg.config_file {
        Some(path) => println!("# Config file: {}", path.display()),
        None => println!("# Config file: (none, using defaults)"),
    }
    print!("{}", cfg.redacted_yaml()?);
    Ok(())
}
