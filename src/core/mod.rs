//! Core audit logic.
//!
//! This module contains:
//! - Validator: rule-based name scoring and suggestions
//! - Reconcile: mapping corrections back onto dataset cells
//! - Apply: writing corrections with audit-trail stamps
//! - Assistant: oracle prompts and answer handling
//! - Retry: backoff for rate-limited oracle calls

pub mod apply;
pub mod assistant;
pub mod reconcile;
pub mod retry;
pub mod validator;

// Re-export commonly used types
pub use apply::{apply_all, apply_correction, AuditStamp};
pub use assistant::{
    request_corrections, request_freeform_answer, request_summary, OracleCorrection,
};
pub use reconcile::{
    audit_dataset, build_correction_table, ReconcileMode, ReconcileOutcome, Reconciler,
};
pub use retry::{retry_rate_limited, RetryPolicy};
pub use validator::{NameError, NameValidator};
