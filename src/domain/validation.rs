//! Name validation results.

use serde::{Deserialize, Serialize};

/// Confidence strictly above this value means the name is valid
pub const VALIDITY_THRESHOLD: u8 = 70;

/// Message used when no issue fired
pub const VALID_NAME_MESSAGE: &str = "Valid Indian name";

/// A structural problem detected in a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Fewer than 3 characters
    TooShort,

    /// Contains a decimal digit
    NumbersPresent,

    /// Contains a character outside the allowed set
    SpecialCharacters,

    /// Two or more consecutive whitespace characters
    ExcessiveSpaces,

    /// A segment is not Title Case
    IncorrectCapitalization,

    /// Fewer than two segments
    MissingLastName,
}

impl IssueKind {
    /// Confidence penalty applied when this issue fires
    pub fn penalty(self) -> u8 {
        match self {
            IssueKind::TooShort => 30,
            IssueKind::NumbersPresent => 40,
            IssueKind::SpecialCharacters => 30,
            IssueKind::ExcessiveSpaces => 15,
            IssueKind::IncorrectCapitalization => 20,
            IssueKind::MissingLastName => 15,
        }
    }

    /// Human-readable description
    pub fn message(self) -> &'static str {
        match self {
            IssueKind::TooShort => "Name is too short",
            IssueKind::NumbersPresent => "Name should not contain numbers",
            IssueKind::SpecialCharacters => "Name contains invalid special characters",
            IssueKind::ExcessiveSpaces => "Name contains excessive spaces",
            IssueKind::IncorrectCapitalization => "Name should be properly capitalized",
            IssueKind::MissingLastName => "Indian names typically include a last name",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of validating a single name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameValidationResult {
    /// The trimmed name that was validated
    pub name: String,

    /// `confidence > VALIDITY_THRESHOLD`
    pub is_valid: bool,

    /// 0..=100
    pub confidence: u8,

    /// Issues in detection order
    pub issues: Vec<IssueKind>,

    /// Deduplicated, in insertion order
    pub suggestions: Vec<String>,

    /// First issue message, or the success note
    pub message: Option<String>,
}

impl NameValidationResult {
    pub fn has_issue(&self, issue: IssueKind) -> bool {
        self.issues.contains(&issue)
    }

    /// First suggestion, if any
    pub fn best_suggestion(&self) -> Option<&str> {
        self.suggestions.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serialization() {
        let json = serde_json::to_string(&IssueKind::MissingLastName).unwrap();
        assert_eq!(json, "\"missing_last_name\"");
    }

    #[test]
    fn test_penalties_sum() {
        let all = [
            IssueKind::TooShort,
            IssueKind::NumbersPresent,
            IssueKind::SpecialCharacters,
            IssueKind::ExcessiveSpaces,
            IssueKind::IncorrectCapitalization,
            IssueKind::MissingLastName,
        ];
        let total: u32 = all.iter().map(|i| i.penalty() as u32).sum();
        assert_eq!(total, 150);
    }
}
