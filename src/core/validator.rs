//! Rule-based name validator.
//!
//! Scores a name against structural conventions (length, characters,
//! spacing, capitalization, presence of a last name) and proposes fixes.
//! Checks are independent; penalties add up and the score floors at 0.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::validation::{VALIDITY_THRESHOLD, VALID_NAME_MESSAGE};
use crate::domain::{FirstLastCorrections, IssueKind, NameCorrection, NameValidationResult};

/// Anything outside Latin letters, Devanagari, whitespace, `.`, `-` and `'`
static DISALLOWED_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z\x{0900}-\x{097F}\s.\-']").expect("Invalid disallowed-character regex")
});

static DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("Invalid digit regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Invalid whitespace regex"));

/// Surnames appended to single-segment names
pub const SURNAME_SUGGESTIONS: [&str; 9] = [
    "Sharma", "Patel", "Singh", "Kumar", "Verma", "Rao", "Reddy", "Nair", "Joshi",
];

/// How many surname suggestions a single-segment name receives
pub const SURNAME_SUGGESTION_COUNT: usize = 3;

const MIN_NAME_CHARS: usize = 3;

/// Validator input errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Invalid input: name must be a non-empty string")]
    InvalidInput,
}

/// Name validator with a deterministic surname draw
#[derive(Debug, Clone, Default)]
pub struct NameValidator {
    /// Offset into `SURNAME_SUGGESTIONS` for the surname draw
    seed: u64,
}

impl NameValidator {
    /// Validator drawing the first surnames of the reference list
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator drawing surnames starting at `seed % len` (wrapping)
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// Validate a single name
    pub fn validate(&self, name: &str) -> Result<NameValidationResult, NameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(NameError::InvalidInput);
        }

        let issues = detect_issues(trimmed);
        let penalty: u32 = issues.iter().map(|i| i.penalty() as u32).sum();
        let confidence = 100u32.saturating_sub(penalty) as u8;
        let is_valid = confidence > VALIDITY_THRESHOLD;
        let suggestions = self.suggestions(trimmed, &issues);

        let message = match issues.first() {
            Some(issue) => Some(issue.message().to_string()),
            None => Some(VALID_NAME_MESSAGE.to_string()),
        };

        debug!(is_valid, confidence, issues = issues.len(), "Validated name");

        Ok(NameValidationResult {
            name: trimmed.to_string(),
            is_valid,
            confidence,
            issues,
            suggestions,
            message,
        })
    }

    /// Validate a flat list of names, failing on the first invalid input
    pub fn validate_batch<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<NameValidationResult>, NameError> {
        names.iter().map(|n| self.validate(n.as_ref())).collect()
    }

    /// Validate paired first/last name lists into corrections.
    ///
    /// Blank entries pass through unchanged.
    pub fn reconcile_first_last<S: AsRef<str>>(
        &self,
        first_names: &[S],
        last_names: &[S],
    ) -> FirstLastCorrections {
        FirstLastCorrections {
            first_name_corrections: first_names
                .iter()
                .map(|n| self.correction_for(n.as_ref()))
                .collect(),
            last_name_corrections: last_names
                .iter()
                .map(|n| self.correction_for(n.as_ref()))
                .collect(),
        }
    }

    /// Local correction for one value: first suggestion, flagged when invalid
    pub fn correction_for(&self, name: &str) -> NameCorrection {
        match self.validate(name) {
            Ok(result) => NameCorrection {
                original: name.to_string(),
                corrected: result
                    .best_suggestion()
                    .map(str::to_string)
                    .unwrap_or_else(|| name.to_string()),
                needs_correction: !result.is_valid,
                reason: result.message,
            },
            Err(NameError::InvalidInput) => NameCorrection::unchanged(name),
        }
    }

    fn suggestions(&self, name: &str, issues: &[IssueKind]) -> Vec<String> {
        let segments: Vec<&str> = name.split_whitespace().collect();
        let mut suggestions: Vec<String> = Vec::new();

        if issues.contains(&IssueKind::IncorrectCapitalization) {
            let fixed: Vec<String> = segments.iter().map(|s| title_case(s)).collect();
            suggestions.push(fixed.join(" "));
        }

        if issues.contains(&IssueKind::ExcessiveSpaces) {
            suggestions.push(segments.join(" "));
        }

        if issues.contains(&IssueKind::MissingLastName) && segments.len() == 1 {
            let first = title_case(segments[0]);
            let start = (self.seed % SURNAME_SUGGESTIONS.len() as u64) as usize;
            for i in 0..SURNAME_SUGGESTION_COUNT {
                let surname = SURNAME_SUGGESTIONS[(start + i) % SURNAME_SUGGESTIONS.len()];
                suggestions.push(format!("{} {}", first, surname));
            }
        }

        let mut unique: Vec<String> = Vec::with_capacity(suggestions.len());
        for suggestion in suggestions {
            if !unique.contains(&suggestion) {
                unique.push(suggestion);
            }
        }
        unique
    }
}

/// Validate with the default validator
pub fn validate(name: &str) -> Result<NameValidationResult, NameError> {
    NameValidator::new().validate(name)
}

/// Run every structural check on an already-trimmed name, in fixed order
fn detect_issues(name: &str) -> Vec<IssueKind> {
    let mut issues = Vec::new();

    if name.chars().count() < MIN_NAME_CHARS {
        issues.push(IssueKind::TooShort);
    }

    if DIGIT.is_match(name) {
        issues.push(IssueKind::NumbersPresent);
    }

    if DISALLOWED_CHAR.is_match(name) {
        issues.push(IssueKind::SpecialCharacters);
    }

    if WHITESPACE_RUN.is_match(name) {
        issues.push(IssueKind::ExcessiveSpaces);
    }

    let segments: Vec<&str> = name.split_whitespace().collect();

    if !segments.iter().all(|s| is_title_case(s)) {
        issues.push(IssueKind::IncorrectCapitalization);
    }

    if segments.len() < 2 {
        issues.push(IssueKind::MissingLastName);
    }

    issues
}

/// First character upper, remainder lower (caseless characters pass)
fn is_title_case(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str();
            first.to_uppercase().eq(std::iter::once(first)) && rest.to_lowercase() == rest
        }
        None => false,
    }
}

/// Uppercase the first character and lowercase the rest
pub fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
