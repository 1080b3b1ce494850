//! Case-record datasets.
//!
//! A dataset is an ordered list of records sharing one column set (the CSV
//! header). It is the only mutable entity in an audit session; everything
//! derived from it (validation results, correction tables) is recomputed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CASE_TITLE: &str = "Case Title";
pub const DATE: &str = "Date";
pub const ACCUSED_FIRST_NAME: &str = "Accused First Name";
pub const ACCUSED_LAST_NAME: &str = "Accused Last Name";
pub const CRIME: &str = "Crime";
pub const ACCUSED_STATUS: &str = "AccusedStatus";
pub const CRIMINAL_LOCATION: &str = "Criminal Location";
pub const POLICE_STATION: &str = "Police Station";
pub const INSPECTOR_IN_CHARGE: &str = "Inspector In charge";
pub const LAST_AUDIT_DATE: &str = "Last Audit Date";
pub const LAST_AUDIT_BY: &str = "Last Audit By";
pub const LAST_AUDIT_STATUS: &str = "Last Audit Status";
pub const LAST_AUDIT_REMARKS: &str = "Last Audit Remarks";
pub const LAST_AUDIT_LOCATION: &str = "Last Audit Location";

/// Columns a case-record CSV is expected to carry, in display order.
pub const EXPECTED_COLUMNS: [&str; 14] = [
    CASE_TITLE,
    DATE,
    ACCUSED_FIRST_NAME,
    ACCUSED_LAST_NAME,
    CRIME,
    ACCUSED_STATUS,
    CRIMINAL_LOCATION,
    POLICE_STATION,
    INSPECTOR_IN_CHARGE,
    LAST_AUDIT_DATE,
    LAST_AUDIT_BY,
    LAST_AUDIT_STATUS,
    LAST_AUDIT_REMARKS,
    LAST_AUDIT_LOCATION,
];

/// Name columns scanned during reconciliation, in priority order.
pub const NAME_COLUMNS: [&str; 3] = [ACCUSED_FIRST_NAME, ACCUSED_LAST_NAME, INSPECTOR_IN_CHARGE];

/// Errors raised by dataset operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("Row {row} has {found} columns, expected {expected}")]
    NonUniformColumns {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} is out of range (dataset has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },
}

/// One row of the dataset: column name to cell value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(HashMap<String, String>);

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Cell value, or "" when the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }

    /// Whether the record has a value (possibly empty) for the column
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    /// Number of columns present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Where a dataset came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// Source file name
    pub source_name: String,

    /// Size of the source in bytes
    pub size_bytes: u64,

    /// When the dataset was loaded
    pub loaded_at: DateTime<Utc>,

    /// Last in-session mutation (None until edited)
    pub modified_at: Option<DateTime<Utc>>,
}

impl Provenance {
    pub fn new(source_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            source_name: source_name.into(),
            size_bytes,
            loaded_at: Utc::now(),
            modified_at: None,
        }
    }
}

/// An ordered set of case records with a shared header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Record>,
    provenance: Provenance,
}

impl Dataset {
    /// Build a dataset; rows are padded with "" for any header column they lack.
    pub fn new(columns: Vec<String>, rows: Vec<Record>, provenance: Provenance) -> Self {
        let mut rows = rows;
        for row in &mut rows {
            for column in &columns {
                if !row.contains(column) {
                    row.set(column.clone(), "");
                }
            }
        }

        Self {
            columns,
            rows,
            provenance,
        }
    }

    /// Header columns in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Whether the dataset was mutated since load
    pub fn is_modified(&self) -> bool {
        self.provenance.modified_at.is_some()
    }

    /// Cell value by 0-based row index; "" for unknown columns
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row).map(|r| r.get(column))
    }

    /// Set a cell by 0-based row index.
    ///
    /// A column the dataset does not have yet is appended to the header and
    /// backfilled with "" on every other row.
    pub fn set_cell(
        &mut self,
        row: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<(), DatasetError> {
        let len = self.rows.len();
        if row >= len {
            return Err(DatasetError::RowOutOfRange { row, len });
        }

        if !self.has_column(column) {
            self.columns.push(column.to_string());
            for record in &mut self.rows {
                record.set(column, "");
            }
        }

        self.rows[row].set(column, value);
        self.touch();
        Ok(())
    }

    /// Remove a row by 0-based index, returning it
    pub fn delete_row(&mut self, row: usize) -> Result<Record, DatasetError> {
        let len = self.rows.len();
        if row >= len {
            return Err(DatasetError::RowOutOfRange { row, len });
        }
        let removed = self.rows.remove(row);
        self.touch();
        Ok(removed)
    }

    /// Verify every row carries exactly the header's column set
    pub fn check_uniform(&self) -> Result<(), DatasetError> {
        let expected = self.columns.len();
        for (idx, row) in self.rows.iter().enumerate() {
            let all_present = self.columns.iter().all(|c| row.contains(c));
            if !all_present || row.len() != expected {
                return Err(DatasetError::NonUniformColumns {
                    row: idx + 1,
                    expected,
                    found: row.len(),
                });
            }
        }
        Ok(())
    }

    /// Expected case-record columns the header lacks
    pub fn missing_expected_columns(&self) -> Vec<String> {
        EXPECTED_COLUMNS
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Rows rendered as ordered JSON objects (header order), limited to `limit` rows
    pub fn to_json_rows(&self, limit: usize) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .take(limit)
            .map(|record| {
                let object: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .map(|c| (c.clone(), serde_json::Value::String(record.get(c).to_string())))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    /// Record the size of the snapshot last written for this dataset
    pub fn set_size(&mut self, size_bytes: u64) {
        self.provenance.size_bytes = size_bytes;
    }

    fn touch(&mut self) {
        self.provenance.modified_at = Some(Utc::now());
    }
}
