//! Applying correction-table entries to a dataset with audit-trail stamps.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::dataset::{
    LAST_AUDIT_BY, LAST_AUDIT_DATE, LAST_AUDIT_LOCATION, LAST_AUDIT_REMARKS, LAST_AUDIT_STATUS,
};
use crate::domain::{CorrectionTableEntry, Dataset, DatasetError};

/// Identity used when no user is known
pub const ANONYMOUS_USER: &str = "Anonymous User";

/// Status written to the audit-status column
pub const CORRECTED_STATUS: &str = "Corrected";

/// Who applied a correction, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub date: NaiveDate,
    pub by: String,
}

impl AuditStamp {
    pub fn new(date: NaiveDate, by: Option<&str>) -> Self {
        let by = by
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(ANONYMOUS_USER)
            .to_string();
        Self { date, by }
    }

    /// Stamp for today's local date
    pub fn today(by: Option<&str>) -> Self {
        Self::new(Local::now().date_naive(), by)
    }
}

/// Remarks text for an applied correction
pub fn correction_remarks(original: &str, suggested: &str) -> String {
    format!("Corrected \"{}\" to \"{}\"", original, suggested)
}

/// Apply one entry; returns `false` when its row is out of range
pub fn apply_correction(
    dataset: &mut Dataset,
    entry: &CorrectionTableEntry,
    stamp: &AuditStamp,
) -> Result<bool, DatasetError> {
    let Some(row) = entry.row.checked_sub(1).filter(|r| *r < dataset.len()) else {
        warn!(row = entry.row, len = dataset.len(), "Correction row out of range, skipping");
        return Ok(false);
    };

    dataset.set_cell(row, &entry.column, entry.suggested_value.as_str())?;
    dataset.set_cell(row, LAST_AUDIT_DATE, stamp.date.format("%Y-%m-%d").to_string())?;
    dataset.set_cell(row, LAST_AUDIT_BY, stamp.by.as_str())?;
    dataset.set_cell(row, LAST_AUDIT_STATUS, CORRECTED_STATUS)?;
    dataset.set_cell(
        row,
        LAST_AUDIT_REMARKS,
        correction_remarks(&entry.original_value, &entry.suggested_value),
    )?;
    dataset.set_cell(row, LAST_AUDIT_LOCATION, entry.column.as_str())?;

    debug!(row = entry.row, column = %entry.column, "Applied correction");
    Ok(true)
}

/// Apply every entry in one pass; returns how many applied
pub fn apply_all(
    dataset: &mut Dataset,
    table: &[CorrectionTableEntry],
    stamp: &AuditStamp,
) -> Result<usize, DatasetError> {
    let mut applied = 0;
    for entry in table {
        if apply_correction(dataset, entry, stamp)? {
            applied += 1;
        }
    }

    info!(applied, total = table.len(), "Applied corrections");
    Ok(applied)
}
