//! Dataset ingestion.
//!
//! CSV text (from disk or the file library) becomes a `Dataset`, with
//! shape warnings for missing expected columns.

pub mod csv;

// Re-export key types
pub use self::csv::{parse_csv, to_csv, DatasetShapeWarning, LoadReport};
