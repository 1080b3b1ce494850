//! casewarden - name auditing for police case-record datasets
//!
//! Validates and corrects Indian name fields in CSV datasets using a
//! rule-based validator, with an optional generative-language oracle for
//! higher-quality suggestions.
//!
//! # Architecture
//!
//! An audit is a pipeline over an owned `Dataset`:
//! - Name cells are extracted from the name columns
//! - Each name is validated locally, or by the oracle (falling back to
//!   local validation on any oracle failure)
//! - Corrections are located at their first matching cell
//! - Applying a correction writes the cell and the audit-trail columns
//!
//! # Modules
//!
//! - `adapters`: Oracle backends (Gemini)
//! - `core`: Validator, reconciliation, apply, oracle operations, retry
//! - `domain`: Data structures (Dataset, NameValidationResult, corrections)
//! - `ingest`: CSV parsing and export
//! - `library`: Stored files and correction history
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Validate a name
//! casewarden validate "rajesh  kumar"
//!
//! # Audit a dataset, apply corrections, write the result
//! casewarden audit cases.csv --apply --output corrected.csv
//!
//! # Use the oracle for first/last names
//! GEMINI_API_KEY=... casewarden audit cases.csv --remote --summary
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{GeminiOracle, GenerationConfig, Oracle, OracleError};
pub use crate::core::{
    apply_all, apply_correction, AuditStamp, NameError, NameValidator, ReconcileMode,
    ReconcileOutcome, Reconciler, RetryPolicy,
};
pub use domain::{
    CorrectionTableEntry, Dataset, IssueKind, NameCorrection, NameValidationResult, Record,
};
pub use ingest::{parse_csv, to_csv, LoadReport};
pub use library::{CorrectionHistory, FileCatalog};
