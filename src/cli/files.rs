//! File library subcommands.
//!
//! Provides commands to:
//! - `list`: Show the owner's stored files
//! - `show`: Preview a stored file as a dataset
//! - `save`: Store a CSV file (replacing a same-named entry)
//! - `remove`: Delete a stored file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config;
use crate::ingest::parse_csv;
use crate::library::FileCatalog;

use super::{file_name, resolve_owner};

/// File-library subcommands
#[derive(Subcommand, Debug)]
pub enum FilesCommands {
    /// List stored files
    List {
        /// Owner identity (defaults to the configured user)
        #[arg(long)]
        user: Option<String>,
    },

    /// Preview a stored file
    Show {
        /// Stored file name
        name: String,

        /// Number of rows to print
        #[arg(short, long, default_value = "10")]
        rows: usize,

        #[arg(long)]
        user: Option<String>,
    },

    /// Store a CSV file
    Save {
        /// Path to the CSV file
        path: PathBuf,

        /// Name to store it under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        user: Option<String>,
    },

    /// Remove a stored file
    Remove {
        /// Stored file name
        name: String,

        #[arg(long)]
        user: Option<String>,
    },
}

/// Execute file-library subcommands
pub async fn execute(command: FilesCommands) -> Result<()> {
    let cfg = config::config()?;
    let files_dir = cfg.files_dir();

    match command {
        FilesCommands::List { user } => {
            let owner = resolve_owner(cfg, user.as_deref());
            let catalog = FileCatalog::load(&files_dir, &owner).await?;

            if catalog.is_empty() {
                println!("No stored files for {}", owner);
                return Ok(());
            }

            println!("{:<32} {:>10}  {:<20}", "NAME", "SIZE", "UPLOADED");
            println!("{}", "-".repeat(66));
            for file in catalog.list() {
                println!(
                    "{:<32} {:>10}  {:<20}",
                    file.name,
                    file.size,
                    file.uploaded_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        FilesCommands::Show { name, rows, user } => {
            let owner = resolve_owner(cfg, user.as_deref());
            let catalog = FileCatalog::load(&files_dir, &owner).await?;
            let file = catalog
                .get(&name)
                .with_context(|| format!("No stored file named '{}'", name))?;

            let report = parse_csv(&file.data, &file.name)?;
            for warning in &report.warnings {
                eprintln!("[warning] {}", warning);
            }

            let dataset = &report.dataset;
            println!("File: {}", file.name);
            println!("Size: {} bytes", file.size);
            println!("Uploaded: {}", file.uploaded_at);
            println!("Rows: {}", dataset.len());
            println!("Columns: {}", dataset.columns().join(", "));
            println!();
            println!("{}", serde_json::to_string_pretty(&dataset.to_json_rows(rows))?);
        }
        FilesCommands::Save { path, name, user } => {
            let owner = resolve_owner(cfg, user.as_deref());
            let data = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

            // Reject files that would not load later
            let report = parse_csv(&data, &file_name(&path))?;
            for warning in &report.warnings {
                eprintln!("[warning] {}", warning);
            }

            let name = name.unwrap_or_else(|| file_name(&path));
            let mut catalog = FileCatalog::load(&files_dir, &owner).await?;
            let size = catalog.upsert(&name, data).size;
            catalog.save(&files_dir).await?;

            eprintln!(
                "Saved {} ({} rows, {} bytes) for {}",
                name,
                report.dataset.len(),
                size,
                owner
            );
        }
        FilesCommands::Remove { name, user } => {
            let owner = resolve_owner(cfg, user.as_deref());
            let mut catalog = FileCatalog::load(&files_dir, &owner).await?;

            match catalog.remove(&name) {
                Some(_) => {
                    catalog.save(&files_dir).await?;
                    eprintln!("Removed {}", name);
                }
                None => anyhow::bail!("No stored file named '{}'", name),
            }
        }
    }

    Ok(())
}
