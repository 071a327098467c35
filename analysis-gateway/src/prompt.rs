//! Prompt construction for every analysis task.
//!
//! Each prompt pins the exact JSON shape that [`crate::parse`] decodes. When
//! no problem context is supplied the model is asked to infer the problem
//! from the code first.

use crate::model::{AnalysisKind, AnalysisTask, Language, Submission};

/// Characters of problem summary kept in full analysis prompts.
pub const PROBLEM_SUMMARY_LIMIT: usize = 500;
/// Characters of problem summary kept in quick/explain prompts.
pub const SHORT_PROBLEM_SUMMARY_LIMIT: usize = 300;

/// A provider-agnostic chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    /// Sampling temperature suited to the task.
    pub temperature: f32,
}

impl Prompt {
    fn new(system: &str, user: String, temperature: f32) -> Self {
        Self {
            system: system.to_string(),
            user,
            temperature,
        }
    }
}

fn code_block(language: Language, code: &str) -> String {
    format!("Code:\n```{language}\n{code}\n```")
}

fn problem_line(sub: &Submission<'_>, limit: usize) -> Option<String> {
    sub.problem
        .map(|p| p.summary(limit))
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("Problem: {s}"))
}

/// Builds the prompt for `task`.
pub fn build(task: &AnalysisTask, sub: &Submission<'_>) -> Prompt {
    match task {
        AnalysisTask::Analyze(AnalysisKind::Complexity) => complexity(sub),
        AnalysisTask::Analyze(AnalysisKind::Hints) => hints(sub),
        AnalysisTask::Analyze(AnalysisKind::Optimization) => optimization(sub),
        AnalysisTask::Analyze(AnalysisKind::Debugging) => debugging(sub),
        AnalysisTask::QuickComplexity => quick_complexity(sub),
        AnalysisTask::ExplainComplexity {
            time_complexity,
            space_complexity,
        } => explain_complexity(sub, time_complexity, space_complexity),
    }
}

fn complexity(sub: &Submission<'_>) -> Prompt {
    let lang = sub.language;
    let code = code_block(lang, sub.code);
    let user = match problem_line(sub, PROBLEM_SUMMARY_LIMIT) {
        Some(problem) => format!(
            r#"Analyze the time and space complexity of the following {lang} solution.

{problem}

{code}

Respond with JSON only, using exactly this structure:
{{
  "time_complexity": "O(...)",
  "space_complexity": "O(...)",
  "explanation": "why the complexity is what it is",
  "key_operations": ["operation1", "operation2"],
  "improvements": ["suggestion1"]
}}
"improvements" is optional. Be specific and justify the bounds."#
        ),
        None => format!(
            r#"Analyze the time and space complexity of the following {lang} code. First infer which problem it solves from names, data structures and logic, then analyze it.

{code}

Respond with JSON only, using exactly this structure:
{{
  "time_complexity": "O(...)",
  "space_complexity": "O(...)",
  "explanation": "why the complexity is what it is",
  "key_operations": ["operation1", "operation2"],
  "improvements": ["suggestion1"],
  "inferred_problem": "what problem this code appears to solve",
  "inferred_problem_title": "Problem Name"
}}
"improvements" and "inferred_problem_title" are optional. Be specific and justify the bounds."#
        ),
    };
    Prompt::new(
        "You are an expert algorithm analyst. Provide accurate Big O complexity analysis.",
        user,
        0.3,
    )
}

fn quick_complexity(sub: &Submission<'_>) -> Prompt {
    let lang = sub.language;
    let code = code_block(lang, sub.code);
    let user = match problem_line(sub, SHORT_PROBLEM_SUMMARY_LIMIT) {
        Some(problem) => format!(
            r#"Give ONLY the time and space complexity (Big O) of this {lang} code.

{problem}

{code}

Respond with JSON only:
{{
  "time_complexity": "O(...)",
  "space_complexity": "O(...)"
}}
No explanations."#
        ),
        None => format!(
            r#"Give ONLY the time and space complexity (Big O) of this {lang} code.

{code}

Respond with JSON only:
{{
  "time_complexity": "O(...)",
  "space_complexity": "O(...)",
  "inferred_problem": "one sentence describing the problem",
  "inferred_problem_title": "Problem Name"
}}
"inferred_problem_title" is optional. No explanations."#
        ),
    };
    Prompt::new(
        "You are an expert algorithm analyst. Provide ONLY the Big O complexity notation.",
        user,
        0.3,
    )
}

fn explain_complexity(sub: &Submission<'_>, time: &str, space: &str) -> Prompt {
    let lang = sub.language;
    let code = code_block(lang, sub.code);
    let problem = problem_line(sub, SHORT_PROBLEM_SUMMARY_LIMIT)
        .map(|p| format!("\n\n{p}"))
        .unwrap_or_default();
    let user = format!(
        r#"This {lang} code runs in {time} time and {space} space.{problem}

{code}

Explain why. Respond with JSON only:
{{
  "explanation": "why the complexity is {time} time and {space} space",
  "key_operations": ["operation that drives the complexity"],
  "improvements": ["suggestion1"]
}}
"improvements" is optional; include it only when a real optimization exists."#
    );
    Prompt::new(
        "You are an expert algorithm analyst. Explain complexity analysis in detail.",
        user,
        0.3,
    )
}

fn hints(sub: &Submission<'_>) -> Prompt {
    let lang = sub.language;
    let code = code_block(lang, sub.code);
    let shape = r#"{
  "hints": ["general hint", "more specific hint", "most specific hint"],
  "progressive": true,
  "next_steps": ["step1", "step2"]
}"#;
    let user = match problem_line(sub, PROBLEM_SUMMARY_LIMIT) {
        Some(problem) => format!(
            "The user is working on this problem and needs guidance.\n\n{problem}\n\nCurrent {code}\n\n\
             Give exactly 3 progressive hints, from general to specific, that lead toward a \
             solution WITHOUT revealing the full implementation. Respond with JSON only:\n{shape}"
        ),
        None => format!(
            "The user needs guidance. First infer which problem they are solving from the code.\n\n\
             Current {code}\n\n\
             Give 3 to 5 progressive hints, from general to specific, that lead toward a solution \
             WITHOUT revealing the full implementation. Start by naming the problem you think they \
             are solving. Respond with JSON only:\n{shape}"
        ),
    };
    Prompt::new(
        "You are a helpful coding mentor. Provide hints that guide learning without spoiling solutions.",
        user,
        0.7,
    )
}

fn optimization(sub: &Submission<'_>) -> Prompt {
    let lang = sub.language;
    let code = code_block(lang, sub.code);
    let shape = r#"{
  "current_complexity": "O(...)",
  "optimized_complexity": "O(...)",
  "suggestions": [
    {
      "area": "Data structure",
      "current_approach": "Using an array",
      "suggested_approach": "Use a hash map",
      "impact": "Reduces time from O(n^2) to O(n)"
    }
  ],
  "code_examples": ["example"]
}"#;
    let intro = match problem_line(sub, PROBLEM_SUMMARY_LIMIT) {
        Some(problem) => format!("Suggest optimizations for this {lang} solution.\n\n{problem}"),
        None => format!(
            "Suggest optimizations for this {lang} solution. First infer which problem it solves."
        ),
    };
    let user = format!(
        "{intro}\n\n{code}\n\nRespond with JSON only:\n{shape}\n\"code_examples\" is optional. \
         Focus on practical improvements with significant impact."
    );
    Prompt::new(
        "You are an expert at code optimization. Provide actionable suggestions.",
        user,
        0.5,
    )
}

fn debugging(sub: &Submission<'_>) -> Prompt {
    let lang = sub.language;
    let code = code_block(lang, sub.code);
    let shape = r#"{
  "issues": [
    {"line": 5, "description": "Off-by-one error", "severity": "high"},
    {"line": null, "description": "Missing edge case", "severity": "medium"}
  ],
  "fixes": [
    {"issue": "Off-by-one error", "suggestion": "Change < to <=", "code_example": "for i in range(len(arr)):"}
  ],
  "test_cases": ["empty input", "single element", "duplicate values"]
}"#;
    let intro = match problem_line(sub, PROBLEM_SUMMARY_LIMIT) {
        Some(problem) => format!("Debug this {lang} code.\n\n{problem}"),
        None => format!("Debug this {lang} code. First infer which problem it is trying to solve."),
    };
    let user = format!(
        "{intro}\n\n{code}\n\nRespond with JSON only:\n{shape}\n\
         \"severity\" must be one of low, medium, high. \"test_cases\" must be an array of strings. \
         Be specific about line numbers and give concrete fixes."
    );
    Prompt::new(
        "You are an expert debugger. Identify issues and provide clear fixes.",
        user,
        0.3,
    )
}

/// Prompt for the provider-backed completeness check.
pub fn completeness(code: &str, language: Language) -> Prompt {
    let code = code_block(language, code);
    let user = format!(
        r#"Is this {language} code a complete solution?

{code}

Respond with JSON only:
{{
  "is_complete": true,
  "missing_elements": ["element1"],
  "confidence": 0.95
}}
Judge ONLY implementation and logic: a complete solution has a function definition, the full logic and a return of its result. IGNORE missing imports."#
    );
    Prompt::new(
        "You are a code reviewer. Decide whether code is complete based on its implementation logic, not its imports.",
        user,
        0.3,
    )
}
