//! Batch reconciliation: extract name cells, validate them locally or via the
//! oracle, and map corrections back to dataset coordinates.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::assistant::{request_corrections, OracleCorrection};
use super::validator::NameValidator;
use crate::adapters::{GenerationConfig, Oracle};
use crate::domain::correction::DEFAULT_CORRECTION_REASON;
use crate::domain::{Anomaly, CorrectionTableEntry, Dataset, DatasetError, NameCorrection};

/// How a reconciliation pass validated its names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Rule validator only
    Local,
    /// Oracle for the first two columns, rule validator for the rest
    Remote,
    /// Oracle failed; rule validator for everything
    LocalFallback,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub corrections: Vec<NameCorrection>,
    pub correction_table: Vec<CorrectionTableEntry>,
    pub mode: ReconcileMode,
}

/// A non-empty name cell found during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedName {
    /// 0-based row index
    pub row: usize,
    pub column: String,
    /// Raw cell value
    pub value: String,
}

/// Collect non-empty cells per column, in column-priority order
pub fn extract_names(dataset: &Dataset, name_columns: &[&str]) -> Vec<Vec<ExtractedName>> {
    let mut extracted: Vec<Vec<ExtractedName>> = vec![Vec::new(); name_columns.len()];

    for (row, record) in dataset.rows().iter().enumerate() {
        for (idx, column) in name_columns.iter().enumerate() {
            let value = record.get(column);
            if !value.trim().is_empty() {
                extracted[idx].push(ExtractedName {
                    row,
                    column: column.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    extracted
}

/// Locate each flagged correction at its first matching cell.
///
/// Rows are scanned in order and, within a row, columns in `name_columns`
/// order. Each distinct original value yields at most one entry.
pub fn build_correction_table(
    dataset: &Dataset,
    name_columns: &[&str],
    corrections: &[NameCorrection],
) -> Vec<CorrectionTableEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut table = Vec::new();

    for correction in corrections.iter().filter(|c| c.needs_correction) {
        if !seen.insert(correction.original.as_str()) {
            continue;
        }

        let located = dataset.rows().iter().enumerate().find_map(|(row, record)| {
            name_columns
                .iter()
                .find(|column| record.get(column) == correction.original)
                .map(|column| (row + 1, column.to_string()))
        });

        match located {
            Some((row, column)) if row > 0 && !column.is_empty() => {
                table.push(CorrectionTableEntry {
                    row,
                    column,
                    original_value: correction.original.clone(),
                    suggested_value: correction.corrected.clone(),
                    reason: correction
                        .reason
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CORRECTION_REASON.to_string()),
                });
            }
            _ => debug!("Correction has no matching cell, skipping"),
        }
    }

    table
}

/// Flag every invalid name cell by position.
///
/// Unlike the correction table, duplicates are reported at every cell.
pub fn audit_dataset(
    validator: &NameValidator,
    dataset: &Dataset,
    name_columns: &[&str],
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for (row, record) in dataset.rows().iter().enumerate() {
        for column in name_columns {
            let value = record.get(column);
            let Ok(result) = validator.validate(value) else {
                continue;
            };
            if result.is_valid {
                continue;
            }

            anomalies.push(Anomaly {
                row: row + 1,
                column: column.to_string(),
                value: value.to_string(),
                message: result
                    .message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CORRECTION_REASON.to_string()),
                suggestion: result.best_suggestion().map(str::to_string),
            });
        }
    }

    anomalies
}

fn from_oracle(correction: OracleCorrection) -> NameCorrection {
    NameCorrection {
        original: correction.original_name,
        corrected: correction.suggested_name.trim().to_string(),
        needs_correction: true,
        reason: correction.reason,
    }
}

/// Runs reconciliation passes with an optional oracle
pub struct Reconciler {
    validator: NameValidator,
    oracle: Option<Arc<dyn Oracle>>,
    generation: GenerationConfig,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(NameValidator::default())
    }
}

impl Reconciler {
    /// A local-only reconciler
    pub fn new(validator: NameValidator) -> Self {
        Self {
            validator,
            oracle: None,
            generation: GenerationConfig::default(),
        }
    }

    /// Delegate the first two name columns to `oracle`
    pub fn with_oracle(mut self, oracle: Arc<dyn Oracle>, generation: GenerationConfig) -> Self {
        self.oracle = Some(oracle);
        self.generation = generation;
        self
    }

    /// Run one reconciliation pass.
    ///
    /// Fails only when the dataset itself is malformed; oracle failures fall
    /// back to local validation.
    #[instrument(skip_all, fields(rows = dataset.len(), columns = name_columns.len()))]
    pub async fn reconcile(
        &self,
        dataset: &Dataset,
        name_columns: &[&str],
    ) -> Result<ReconcileOutcome, DatasetError> {
        dataset.check_uniform()?;

        let extracted = extract_names(dataset, name_columns);
        let total: usize = extracted.iter().map(Vec::len).sum();

        let (corrections, mode) = match &self.oracle {
            None => (self.local_corrections(extracted.iter().flatten()), ReconcileMode::Local),
            Some(oracle) => match self.remote_corrections(oracle.as_ref(), &extracted).await {
                Some(corrections) => (corrections, ReconcileMode::Remote),
                None => (
                    self.local_corrections(extracted.iter().flatten()),
                    ReconcileMode::LocalFallback,
                ),
            },
        };

        let correction_table = build_correction_table(dataset, name_columns, &corrections);

        info!(
            extracted = total,
            corrections = corrections.len(),
            table = correction_table.len(),
            mode = ?mode,
            "Reconciliation complete"
        );

        Ok(ReconcileOutcome {
            corrections,
            correction_table,
            mode,
        })
    }

    fn local_corrections<'a>(
        &self,
        names: impl Iterator<Item = &'a ExtractedName>,
    ) -> Vec<NameCorrection> {
        names
            .map(|name| self.validator.correction_for(&name.value))
            .filter(|c| c.needs_correction)
            .collect()
    }

    /// Oracle for the first two columns, local for the rest; `None` on any
    /// oracle failure
    async fn remote_corrections(
        &self,
        oracle: &dyn Oracle,
        extracted: &[Vec<ExtractedName>],
    ) -> Option<Vec<NameCorrection>> {
        let batch = |idx: usize| -> Vec<String> {
            extracted
                .get(idx)
                .map(|names| names.iter().map(|n| n.value.clone()).collect())
                .unwrap_or_default()
        };
        let first_names = batch(0);
        let last_names = batch(1);

        let result = tokio::try_join!(
            request_corrections(oracle, &self.generation, &first_names),
            request_corrections(oracle, &self.generation, &last_names),
        );

        let (first, last) = match result {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Oracle batch failed, falling back to local validation");
                return None;
            }
        };

        let mut corrections: Vec<NameCorrection> = first
            .into_iter()
            .chain(last)
            .filter(OracleCorrection::is_actionable)
            .map(from_oracle)
            .collect();

        corrections.extend(self.local_corrections(extracted.iter().skip(2).flatten()));
        Some(corrections)
    }
}
