//! Correction types produced by reconciliation.

use serde::{Deserialize, Serialize};

/// Default reason when neither validator nor oracle gave one
pub const DEFAULT_CORRECTION_REASON: &str = "Spelling or formatting correction";

/// A suggested change for one name value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameCorrection {
    pub original: String,
    pub corrected: String,
    pub needs_correction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NameCorrection {
    /// A correction that leaves the value untouched
    pub fn unchanged(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            corrected: original.clone(),
            original,
            needs_correction: false,
            reason: None,
        }
    }
}

/// A correction located at a dataset cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionTableEntry {
    /// 1-indexed row
    pub row: usize,
    pub column: String,
    pub original_value: String,
    pub suggested_value: String,
    pub reason: String,
}

/// Corrections for paired first/last name lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstLastCorrections {
    pub first_name_corrections: Vec<NameCorrection>,
    pub last_name_corrections: Vec<NameCorrection>,
}

/// A name-cell flagged by the local audit (positional, not first-match)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// 1-indexed row
    pub row: usize,
    pub column: String,
    pub value: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
