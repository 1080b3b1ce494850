//! CSV loading and export for case-record datasets.
//!
//! Fields are trimmed, short rows are padded with "", and rows whose fields
//! are all empty are dropped. Missing expected columns are reported as
//! warnings, never as errors.

use std::collections::HashSet;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Dataset, Provenance, Record};

/// Non-fatal problems found while loading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetShapeWarning {
    #[error("Missing expected headers: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// A loaded dataset plus anything worth telling the user
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub dataset: Dataset,
    pub warnings: Vec<DatasetShapeWarning>,
}

/// Parse CSV text with a header row into a dataset
pub fn parse_csv(text: &str, source_name: &str) -> Result<LoadReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(header) => header.with_context(|| format!("Failed to read header of {}", source_name))?,
        None => {
            let dataset = Dataset::new(Vec::new(), Vec::new(), Provenance::new(source_name, 0));
            return Ok(LoadReport {
                warnings: shape_warnings(&dataset),
                dataset,
            });
        }
    };
    let columns = unique_headers(header.iter());

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (idx, record) in records.enumerate() {
        let record =
            record.with_context(|| format!("Failed to read line {} of {}", idx + 2, source_name))?;

        if record.iter().all(str::is_empty) {
            dropped += 1;
            continue;
        }

        let row: Record = columns
            .iter()
            .enumerate()
            .map(|(i, column)| (column.as_str(), record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    debug!(rows = rows.len(), dropped, columns = columns.len(), "Parsed CSV");

    let dataset = Dataset::new(columns, rows, Provenance::new(source_name, text.len() as u64));
    let warnings = shape_warnings(&dataset);
    for warning in &warnings {
        warn!(source = source_name, "{}", warning);
    }

    Ok(LoadReport { dataset, warnings })
}

/// Render a dataset as CSV in header order
pub fn to_csv(dataset: &Dataset) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(dataset.columns())
        .context("Failed to write CSV header")?;
    for row in dataset.rows() {
        writer
            .write_record(dataset.columns().iter().map(|c| row.get(c)))
            .context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn shape_warnings(dataset: &Dataset) -> Vec<DatasetShapeWarning> {
    let missing = dataset.missing_expected_columns();
    if missing.is_empty() {
        Vec::new()
    } else {
        vec![DatasetShapeWarning::MissingColumns(missing)]
    }
}

/// Keep headers unique so each cell has one home; repeats get a numeric suffix
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::new();

    for (idx, name) in raw.enumerate() {
        let base = if name.is_empty() {
            format!("Column {}", idx + 1)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{} ({})", base, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}
