//! Append-only log of applied corrections.
//!
//! Records are newline-delimited JSON. Appends take an exclusive file lock
//! so concurrent CLI invocations never interleave lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::domain::CorrectionTableEntry;

/// One applied correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub owner: String,
    pub source_name: String,
    /// 1-indexed row
    pub row: usize,
    pub column: String,
    pub original: String,
    pub corrected: String,
}

impl CorrectionRecord {
    pub fn new(owner: &str, source_name: &str, entry: &CorrectionTableEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            owner: owner.to_string(),
            source_name: source_name.to_string(),
            row: entry.row,
            column: entry.column.clone(),
            original: entry.original_value.clone(),
            corrected: entry.suggested_value.clone(),
        }
    }
}

/// JSONL correction log
pub struct CorrectionHistory {
    path: PathBuf,
}

impl CorrectionHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append records under an exclusive lock
    pub fn append(&self, records: &[CorrectionRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire file lock on history")?;

        for record in records {
            let json = serde_json::to_string(record).context("Failed to serialize record")?;
            writeln!(file, "{}", json).context("Failed to write record")?;
        }
        file.flush().context("Failed to flush history")?;

        // Lock is released when file is dropped
        Ok(())
    }

    /// All records in append order
    pub async fn replay(&self) -> Result<Vec<CorrectionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut records = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let record: CorrectionRecord = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse history record: {}", line))?;
            records.push(record);
        }

        Ok(records)
    }
}
