//! Request and result types exchanged with the gateway.
//!
//! Result structs mirror the JSON the providers are instructed to return, so
//! they double as the strict decoding targets in [`crate::parse`]. Required
//! fields are non-`Option`; a response missing one fails to decode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error_handler::InputError;

/* ------------------------------------------------------------------------- */
/* Request side                                                              */
/* ------------------------------------------------------------------------- */

/// Programming languages the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    Ruby,
    Swift,
    Kotlin,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::Go,
        Language::Rust,
        Language::Ruby,
        Language::Swift,
        Language::Kotlin,
    ];

    /// Canonical lowercase name, also used inside prompts and fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = match s.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Language::Python,
            "javascript" | "js" | "node" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "java" => Language::Java,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "c" => Language::C,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "ruby" | "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kotlin" | "kt" => Language::Kotlin,
            _ => return Err(InputError::UnsupportedLanguage(s.trim().to_string())),
        };
        Ok(lang)
    }
}

impl TryFrom<String> for Language {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The analyses a caller can ask for through the main `analyze` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AnalysisKind {
    Complexity,
    Hints,
    Optimization,
    Debugging,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Complexity => "complexity",
            AnalysisKind::Hints => "hints",
            AnalysisKind::Optimization => "optimization",
            AnalysisKind::Debugging => "debugging",
        }
    }

    /// Display name used in user-facing notices.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisKind::Complexity => "Complexity",
            AnalysisKind::Hints => "Hints",
            AnalysisKind::Optimization => "Optimization",
            AnalysisKind::Debugging => "Debugging",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "complexity" => Ok(AnalysisKind::Complexity),
            "hints" => Ok(AnalysisKind::Hints),
            "optimization" => Ok(AnalysisKind::Optimization),
            "debugging" => Ok(AnalysisKind::Debugging),
            _ => Err(InputError::UnknownAnalysisKind(s.trim().to_string())),
        }
    }
}

impl TryFrom<String> for AnalysisKind {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Problem the submitted code is meant to solve, already resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemContext {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl ProblemContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            slug: None,
            title: title.into(),
            difficulty: None,
            description: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Stable identity used in cache fingerprints: the slug when known,
    /// otherwise the normalized title.
    pub fn identity(&self) -> String {
        match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slug.to_ascii_lowercase(),
            None => self.title.trim().to_ascii_lowercase(),
        }
    }

    /// `"{title}: {description}"` plus constraints, cut to `limit` characters.
    pub fn summary(&self, limit: usize) -> String {
        let mut text = match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!("{}: {}", self.title.trim(), desc),
            _ => self.title.trim().to_string(),
        };
        if !self.constraints.is_empty() {
            text.push_str("\nConstraints: ");
            text.push_str(&self.constraints.join("; "));
        }
        text.chars().take(limit).collect()
    }
}

/// One call to the main analysis operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub subject_code: String,
    pub language: Language,
    #[serde(default)]
    pub problem_context: Option<ProblemContext>,
    pub analysis_kind: AnalysisKind,
}

impl AnalysisRequest {
    pub fn new(code: impl Into<String>, language: Language, kind: AnalysisKind) -> Self {
        Self {
            subject_code: code.into(),
            language,
            problem_context: None,
            analysis_kind: kind,
        }
    }

    pub fn with_problem(mut self, problem: ProblemContext) -> Self {
        self.problem_context = Some(problem);
        self
    }

    pub fn submission(&self) -> Submission<'_> {
        Submission {
            code: &self.subject_code,
            language: self.language,
            problem: self.problem_context.as_ref(),
        }
    }
}

/// Borrowed view of the code being analyzed, shared by every task.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub code: &'a str,
    pub language: Language,
    pub problem: Option<&'a ProblemContext>,
}

impl<'a> Submission<'a> {
    pub fn new(code: &'a str, language: Language, problem: Option<&'a ProblemContext>) -> Self {
        Self {
            code,
            language,
            problem,
        }
    }
}

/// What the gateway has been asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnalysisTask {
    /// One of the four main analyses.
    Analyze(AnalysisKind),
    /// Big-O only, no explanation.
    QuickComplexity,
    /// Explanation of an already known Big-O.
    ExplainComplexity {
        time_complexity: String,
        space_complexity: String,
    },
}

impl AnalysisTask {
    /// Short label for logs and error records.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisTask::Analyze(kind) => kind.as_str(),
            AnalysisTask::QuickComplexity => "complexity-quick",
            AnalysisTask::ExplainComplexity { .. } => "complexity-explanation",
        }
    }

    /// Text mixed into the cache fingerprint. Explanations include the
    /// Big-O they explain.
    pub fn discriminator(&self) -> String {
        match self {
            AnalysisTask::ExplainComplexity {
                time_complexity,
                space_complexity,
            } => {
                // Length prefixes keep the two fields apart when either contains ':'.
                let (time, space) = (time_complexity.trim(), space_complexity.trim());
                format!(
                    "complexity-explanation:{}:{time}:{}:{space}",
                    time.len(),
                    space.len()
                )
            }
            other => other.label().to_string(),
        }
    }

    pub fn result_kind(&self) -> ResultKind {
        match self {
            AnalysisTask::Analyze(AnalysisKind::Complexity) => ResultKind::Complexity,
            AnalysisTask::Analyze(AnalysisKind::Hints) => ResultKind::Hints,
            AnalysisTask::Analyze(AnalysisKind::Optimization) => ResultKind::Optimization,
            AnalysisTask::Analyze(AnalysisKind::Debugging) => ResultKind::Debugging,
            AnalysisTask::QuickComplexity => ResultKind::QuickComplexity,
            AnalysisTask::ExplainComplexity { .. } => ResultKind::ComplexityExplanation,
        }
    }

    /// Hints are the only task allowed on unfinished code.
    pub fn requires_complete_solution(&self) -> bool {
        !matches!(self, AnalysisTask::Analyze(AnalysisKind::Hints))
    }

    /// Name of the analysis as shown to users.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisTask::Analyze(kind) => kind.title(),
            AnalysisTask::QuickComplexity | AnalysisTask::ExplainComplexity { .. } => "Complexity",
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Result side                                                               */
/* ------------------------------------------------------------------------- */

/// Cacheable result categories, each with its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Complexity,
    QuickComplexity,
    ComplexityExplanation,
    Hints,
    Optimization,
    Debugging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityResult {
    pub time_complexity: String,
    pub space_complexity: String,
    pub explanation: String,
    pub key_operations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_problem_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickComplexityResult {
    pub time_complexity: String,
    pub space_complexity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_problem_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityExplanationResult {
    pub explanation: String,
    pub key_operations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<String>>,
}

/// Hints ordered from general to specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintResult {
    pub hints: Vec<String>,
    pub progressive: bool,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub area: String,
    pub current_approach: String,
    pub suggested_approach: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub current_complexity: String,
    pub optimized_complexity: String,
    pub suggestions: Vec<OptimizationSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_examples: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugIssue {
    pub line: Option<u32>,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugFix {
    pub issue: String,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugResult {
    pub issues: Vec<DebugIssue>,
    pub fixes: Vec<DebugFix>,
    pub test_cases: Vec<String>,
}

/// Returned instead of an analysis when the code looks unfinished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteSolutionNotice {
    pub message: String,
    pub missing_elements: Vec<String>,
    pub confidence: f32,
    pub suggestion: String,
    pub analysis_kind: String,
}

/// Completeness classification of a piece of code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessVerdict {
    pub is_complete: bool,
    pub missing_elements: Vec<String>,
    pub confidence: f32,
}

impl CompletenessVerdict {
    pub fn complete(confidence: f32) -> Self {
        Self {
            is_complete: true,
            missing_elements: Vec::new(),
            confidence,
        }
    }
}

/// Every shape the gateway can hand back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisResult {
    Complexity(ComplexityResult),
    QuickComplexity(QuickComplexityResult),
    ComplexityExplanation(ComplexityExplanationResult),
    Hints(HintResult),
    Optimization(OptimizationResult),
    Debug(DebugResult),
    IncompleteSolution(IncompleteSolutionNotice),
}

impl AnalysisResult {
    /// `None` for the incomplete-solution notice, which is never cached.
    pub fn result_kind(&self) -> Option<ResultKind> {
        match self {
            AnalysisResult::Complexity(_) => Some(ResultKind::Complexity),
            AnalysisResult::QuickComplexity(_) => Some(ResultKind::QuickComplexity),
            AnalysisResult::ComplexityExplanation(_) => Some(ResultKind::ComplexityExplanation),
            AnalysisResult::Hints(_) => Some(ResultKind::Hints),
            AnalysisResult::Optimization(_) => Some(ResultKind::Optimization),
            AnalysisResult::Debug(_) => Some(ResultKind::Debugging),
            AnalysisResult::IncompleteSolution(_) => None,
        }
    }

    pub fn is_incomplete_notice(&self) -> bool {
        matches!(self, AnalysisResult::IncompleteSolution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_aliases() {
        assert_eq!("Python3".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
        assert_eq!(
            "cobol".parse::<Language>(),
            Err(InputError::UnsupportedLanguage("cobol".into()))
        );
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn analysis_kind_rejects_unknown() {
        assert_eq!(
            "HINTS".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::Hints
        );
        assert!(matches!(
            "refactor".parse::<AnalysisKind>(),
            Err(InputError::UnknownAnalysisKind(_))
        ));
        let err = serde_json::from_str::<AnalysisKind>("\"refactor\"");
        assert!(err.is_err());
    }

    #[test]
    fn only_hints_skip_the_gate() {
        assert!(!AnalysisTask::Analyze(AnalysisKind::Hints).requires_complete_solution());
        assert!(AnalysisTask::Analyze(AnalysisKind::Debugging).requires_complete_solution());
        assert!(AnalysisTask::QuickComplexity.requires_complete_solution());
    }

    #[test]
    fn explanation_discriminator_carries_big_o() {
        let a = AnalysisTask::ExplainComplexity {
            time_complexity: "O(n)".into(),
            space_complexity: "O(1)".into(),
        };
        let b = AnalysisTask::ExplainComplexity {
            time_complexity: "O(n log n)".into(),
            space_complexity: "O(1)".into(),
        };
        assert_ne!(a.discriminator(), b.discriminator());
        assert_eq!(a.result_kind(), ResultKind::ComplexityExplanation);
    }

    #[test]
    fn explanation_discriminator_keeps_fields_apart() {
        let left = AnalysisTask::ExplainComplexity {
            time_complexity: "a:b".into(),
            space_complexity: "c".into(),
        };
        let right = AnalysisTask::ExplainComplexity {
            time_complexity: "a".into(),
            space_complexity: "b:c".into(),
        };
        assert_ne!(left.discriminator(), right.discriminator());

        let padded = AnalysisTask::ExplainComplexity {
            time_complexity: " a:b ".into(),
            space_complexity: "c".into(),
        };
        assert_eq!(left.discriminator(), padded.discriminator());
    }

    #[test]
    fn problem_summary_is_truncated() {
        let p = ProblemContext::new("Two Sum").with_description("x".repeat(1000));
        let s = p.summary(500);
        assert!(s.starts_with("Two Sum: xxx"));
        assert_eq!(s.chars().count(), 500);
        assert_eq!(p.identity(), "two sum");
        assert_eq!(p.with_slug("two-sum").identity(), "two-sum");
    }

    #[test]
    fn result_is_tagged_by_type() {
        let r = AnalysisResult::Hints(HintResult {
            hints: vec!["Think about lookups".into()],
            progressive: true,
            next_steps: vec![],
        });
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["type"], "hints");
        assert_eq!(v["hints"][0], "Think about lookups");
        assert_eq!(r.result_kind(), Some(ResultKind::Hints));
    }
}
