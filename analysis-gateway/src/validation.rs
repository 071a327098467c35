//! Pre-flight validation of user input.
//!
//! Produces a [`ValidationReport`] with one [`ValidationIssue`] per problem,
//! each carrying a user-facing suggestion. Validation never calls a provider
//! and never fails; callers decide what to do with an invalid report.

use serde::Serialize;

use crate::model::{AnalysisKind, Language};
use crate::source_scan::{self, bracket_noun};

pub const MIN_CODE_LENGTH: usize = 10;
pub const MAX_CODE_LENGTH: usize = 10_000;

const ANALYSIS_KINDS: [AnalysisKind; 4] = [
    AnalysisKind::Complexity,
    AnalysisKind::Hints,
    AnalysisKind::Optimization,
    AnalysisKind::Debugging,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    EmptyCode,
    InvalidLanguage,
    SyntaxError,
    CodeTooShort,
    CodeTooLong,
    MissingFunction,
    InvalidAnalysisType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub error_type: ValidationErrorType,
    pub field: &'static str,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

impl ValidationIssue {
    fn new(
        error_type: ValidationErrorType,
        field: &'static str,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            field,
            message: message.into(),
            suggestion: suggestion.into(),
            examples: None,
        }
    }

    fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = Some(examples);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_parts(errors: Vec<ValidationIssue>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
    }

    pub fn has_error(&self, error_type: ValidationErrorType) -> bool {
        self.errors.iter().any(|e| e.error_type == error_type)
    }
}

fn language_examples() -> Vec<String> {
    Language::ALL.iter().map(|l| l.as_str().to_string()).collect()
}

fn analysis_examples() -> Vec<String> {
    ANALYSIS_KINDS.iter().map(|k| k.as_str().to_string()).collect()
}

/// Checks length, bracket balance and the presence of a function.
///
/// Syntax and function checks only run when `language` is recognised.
pub fn validate_code(code: &str, language: &str) -> ValidationReport {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return ValidationReport::from_parts(
            vec![ValidationIssue::new(
                ValidationErrorType::EmptyCode,
                "code",
                "Solution code is required",
                "Please paste your solution code in the editor",
            )],
            Vec::new(),
        );
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let length = trimmed.chars().count();
    if length < MIN_CODE_LENGTH {
        errors.push(ValidationIssue::new(
            ValidationErrorType::CodeTooShort,
            "code",
            format!("Code is too short ({length} characters)"),
            format!("Please provide at least {MIN_CODE_LENGTH} characters of code"),
        ));
    }
    if length > MAX_CODE_LENGTH {
        errors.push(ValidationIssue::new(
            ValidationErrorType::CodeTooLong,
            "code",
            format!("Code is too long ({length} characters)"),
            format!("Please keep code under {MAX_CODE_LENGTH} characters"),
        ));
    }

    if let Ok(lang) = language.parse::<Language>() {
        let masked = source_scan::mask(code, lang);
        if let Err(issue) = source_scan::check_brackets(&masked) {
            let noun = bracket_noun(issue.bracket());
            errors.push(ValidationIssue::new(
                ValidationErrorType::SyntaxError,
                "code",
                format!("Mismatched {noun} in code: {issue}"),
                format!(
                    "Check that all opening {noun} have matching closing {noun}, starting at line {}",
                    issue.line()
                ),
            ));
        }
        if !source_scan::has_function_definition(&masked, lang) {
            warnings.push(
                "Code may be missing a function definition. \
                 Most interview solutions require a function or method."
                    .to_string(),
            );
        }
    }

    ValidationReport::from_parts(errors, warnings)
}

pub fn validate_language(language: &str) -> ValidationReport {
    let issue = if language.trim().is_empty() {
        Some(ValidationIssue::new(
            ValidationErrorType::InvalidLanguage,
            "language",
            "Programming language is required",
            "Please select a programming language",
        ))
    } else if language.parse::<Language>().is_err() {
        Some(ValidationIssue::new(
            ValidationErrorType::InvalidLanguage,
            "language",
            format!("Language '{}' is not supported", language.trim()),
            "Please select one of the supported languages",
        ))
    } else {
        None
    };
    let errors = issue
        .map(|i| vec![i.with_examples(language_examples())])
        .unwrap_or_default();
    ValidationReport::from_parts(errors, Vec::new())
}

pub fn validate_analysis_kind(kind: &str) -> ValidationReport {
    let issue = if kind.trim().is_empty() {
        Some(ValidationIssue::new(
            ValidationErrorType::InvalidAnalysisType,
            "analysis_type",
            "Analysis type is required",
            "Please select an analysis type",
        ))
    } else if kind.parse::<AnalysisKind>().is_err() {
        Some(ValidationIssue::new(
            ValidationErrorType::InvalidAnalysisType,
            "analysis_type",
            format!("Analysis type '{}' is not valid", kind.trim()),
            "Please select a valid analysis type",
        ))
    } else {
        None
    };
    let errors = issue
        .map(|i| vec![i.with_examples(analysis_examples())])
        .unwrap_or_default();
    ValidationReport::from_parts(errors, Vec::new())
}

/// Code and language together, for operations that take no analysis type.
pub fn validate_submission(code: &str, language: &str) -> ValidationReport {
    let mut report = validate_code(code, language);
    report.merge(validate_language(language));
    report
}

/// Validates every field of an analysis request and merges the findings.
pub fn validate_analysis_request(code: &str, language: &str, kind: &str) -> ValidationReport {
    let mut report = validate_submission(code, language);
    report.merge(validate_analysis_kind(kind));
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SUM: &str = "def two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n";

    #[test]
    fn valid_request_has_no_errors() {
        let r = validate_analysis_request(TWO_SUM, "python", "complexity");
        assert!(r.is_valid, "{r:?}");
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn empty_code_short_circuits() {
        let r = validate_code("   \n ", "python");
        assert!(!r.is_valid);
        assert_eq!(r.errors.len(), 1);
        assert!(r.has_error(ValidationErrorType::EmptyCode));
    }

    #[test]
    fn length_bounds() {
        assert!(validate_code("x = 1", "python").has_error(ValidationErrorType::CodeTooShort));
        let long = "a".repeat(MAX_CODE_LENGTH + 1);
        assert!(validate_code(&long, "python").has_error(ValidationErrorType::CodeTooLong));
    }

    #[test]
    fn unbalanced_brackets_are_syntax_errors() {
        let r = validate_code("function f(a) {\n  return (a + 1;\n}", "javascript");
        assert!(r.has_error(ValidationErrorType::SyntaxError));
        let issue = &r.errors[0];
        assert!(issue.message.contains("parentheses"), "{}", issue.message);

        // Brackets inside strings do not count.
        let ok = validate_code("function f(a) {\n  return \"((\" + a;\n}", "javascript");
        assert!(ok.is_valid, "{ok:?}");
    }

    #[test]
    fn missing_function_is_only_a_warning() {
        let r = validate_code("total = sum(range(100))\nprint(total)", "python");
        assert!(r.is_valid);
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn unknown_language_and_kind_list_examples() {
        let r = validate_analysis_request(TWO_SUM, "cobol", "refactor");
        assert!(!r.is_valid);
        assert!(r.has_error(ValidationErrorType::InvalidLanguage));
        assert!(r.has_error(ValidationErrorType::InvalidAnalysisType));
        let lang = r
            .errors
            .iter()
            .find(|e| e.error_type == ValidationErrorType::InvalidLanguage)
            .unwrap();
        assert_eq!(lang.examples.as_ref().unwrap().len(), Language::ALL.len());

        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["errors"][0]["error_type"], "invalid_language");
    }
}
