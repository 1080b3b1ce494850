//! Domain types for casewarden.
//!
//! This module contains the core data structures:
//! - Dataset: case records with provenance
//! - Validation: per-name validation results
//! - Correction: suggested changes and their cell coordinates

pub mod correction;
pub mod dataset;
pub mod validation;

// Re-export commonly used types
pub use correction::{Anomaly, CorrectionTableEntry, FirstLastCorrections, NameCorrection};
pub use dataset::{Dataset, DatasetError, Provenance, Record, EXPECTED_COLUMNS, NAME_COLUMNS};
pub use validation::{IssueKind, NameValidationResult};
