//! Persistent state: stored CSV files and the correction history.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.casewarden/
//! ├── history.jsonl             # Applied corrections, append-only
//! └── files/
//!     └── <owner_key>.json      # SHA256(owner)[0:16], stored CSV snapshots
//! ```

pub mod catalog;
pub mod history;

pub use catalog::{FileCatalog, StoredFile};
pub use history::{CorrectionHistory, CorrectionRecord};
