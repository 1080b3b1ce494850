//! Validator Integration Tests
//!
//! Behavioural properties of the rule-based name validator over small
//! name corpora.

use casewarden::core::validator::{title_case, validate};
use casewarden::core::{NameError, NameValidator};
use casewarden::domain::IssueKind;

const WELL_FORMED: &[&str] = &[
    "Rajesh Kumar",
    "Anita Sharma",
    "Venkata Ramana Reddy",
    "Mohammed Iqbal Khan",
    "Priya Nair",
    "Harpreet Singh",
    "D'souza Fernandes",
    "Ram-prasad Joshi",
];

const WITH_DIGITS: &[&str] = &[
    "Rajesh Kumar2",
    "john123",
    "4nita Sharma",
    "R2",
    "Priya Nair 007",
];

const MIXED: &[&str] = &[
    "rajesh kumar",
    "RAJESH KUMAR",
    "Rajesh  Kumar",
    "Ra",
    "Rajesh",
    "R@jesh Kumar",
    "rajesh  KUMAR#1",
    "Anil Rao",
    "a b",
];

#[test]
fn test_well_formed_names_score_full() {
    for name in WELL_FORMED {
        let result = validate(name).unwrap();
        assert!(result.is_valid, "{} should be valid", name);
        assert_eq!(result.confidence, 100, "{} issues: {:?}", name, result.issues);
    }
}

#[test]
fn test_digits_cap_confidence() {
    for name in WITH_DIGITS {
        let result = validate(name).unwrap();
        assert!(result.has_issue(IssueKind::NumbersPresent), "{}", name);
        assert!(result.confidence <= 60, "{} scored {}", name, result.confidence);
        assert!(!result.is_valid);
    }
}

#[test]
fn test_validity_matches_threshold() {
    for name in WELL_FORMED.iter().chain(WITH_DIGITS).chain(MIXED) {
        let result = validate(name).unwrap();
        assert_eq!(result.is_valid, result.confidence > 70, "{}", name);

        let penalty: u32 = result.issues.iter().map(|i| i.penalty() as u32).sum();
        assert_eq!(
            result.confidence as u32,
            100u32.saturating_sub(penalty),
            "{}",
            name
        );
    }
}

#[test]
fn test_capitalization_fix_is_idempotent() {
    for name in MIXED {
        let result = validate(name).unwrap();
        if !result.has_issue(IssueKind::IncorrectCapitalization) {
            continue;
        }

        let fixed = result.best_suggestion().unwrap();
        let again = validate(fixed).unwrap();
        assert!(
            !again.has_issue(IssueKind::IncorrectCapitalization),
            "{} -> {} still flagged",
            name,
            fixed
        );
    }
}

#[test]
fn test_single_segment_names_get_two_segment_suggestions() {
    for name in ["Rajesh", "Meenakshi", "Gurpreet"] {
        let result = validate(name).unwrap();
        assert!(result.has_issue(IssueKind::MissingLastName));
        assert!(result.suggestions.len() >= 3);
        for suggestion in &result.suggestions {
            assert_eq!(suggestion.split_whitespace().count(), 2, "{}", suggestion);
            assert!(suggestion.starts_with(name));
        }
    }
}

#[test]
fn test_john123_scenario() {
    let result = validate("john123").unwrap();
    assert!(!result.is_valid);
    assert!(result.has_issue(IssueKind::NumbersPresent));
    assert!(result.has_issue(IssueKind::MissingLastName));
    assert!(result.confidence <= 45);
}

#[test]
fn test_double_space_scenario() {
    let result = validate("Rajesh  Kumar").unwrap();
    assert!(result.has_issue(IssueKind::ExcessiveSpaces));
    assert!(result.suggestions.contains(&"Rajesh Kumar".to_string()));
}

#[test]
fn test_surname_draw_is_reproducible() {
    let a = NameValidator::with_seed(4).validate("Rajesh").unwrap();
    let b = NameValidator::with_seed(4).validate("Rajesh").unwrap();
    assert_eq!(a.suggestions, b.suggestions);
    assert_eq!(a.suggestions[0], "Rajesh Verma");

    let c = NameValidator::with_seed(13).validate("Rajesh").unwrap();
    assert_eq!(a.suggestions, c.suggestions);
}

#[test]
fn test_invalid_input() {
    assert_eq!(validate(" ").unwrap_err(), NameError::InvalidInput);
    assert_eq!(
        NameError::InvalidInput.to_string(),
        "Invalid input: name must be a non-empty string"
    );
}

#[test]
fn test_title_case_multibyte() {
    assert_eq!(title_case("éLODIE"), "Élodie");
    assert_eq!(title_case("राम"), "राम");
}
