//! Strict decoding of model output into typed results.
//!
//! The only leniency is around the JSON envelope: a surrounding Markdown
//! fence or chatter before/after the object is removed. Everything inside
//! must match the expected shape exactly; otherwise the call is reported as
//! a permanent provider failure so the gateway moves to the next provider.

use serde::de::DeserializeOwned;

use crate::error_handler::ProviderFailure;
use crate::model::{
    AnalysisKind, AnalysisResult, AnalysisTask, ComplexityExplanationResult, ComplexityResult,
    CompletenessVerdict, DebugResult, HintResult, OptimizationResult, QuickComplexityResult,
};

/// Removes a surrounding ```` ```json ```` / ```` ``` ```` fence, if any.
pub fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (`json`, `JSON`, ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Returns the JSON object embedded in a model reply.
fn json_slice(raw: &str) -> &str {
    let text = strip_fences(raw);
    if text.starts_with('{') {
        return text;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn decode<T: DeserializeOwned>(provider: &str, raw: &str, shape: &str) -> Result<T, ProviderFailure> {
    serde_json::from_str(json_slice(raw)).map_err(|e| {
        ProviderFailure::permanent(provider, format!("malformed {shape} response: {e}"))
    })
}

fn require(provider: &str, ok: bool, what: &str) -> Result<(), ProviderFailure> {
    if ok {
        Ok(())
    } else {
        Err(ProviderFailure::permanent(
            provider,
            format!("invalid response: {what}"),
        ))
    }
}

fn non_blank(s: &str) -> bool {
    !s.trim().is_empty()
}

/// Decodes a reply for `task` into the matching [`AnalysisResult`] variant.
///
/// # Errors
/// Permanent [`ProviderFailure`] on any structural or semantic mismatch.
pub fn parse_result(
    task: &AnalysisTask,
    provider: &str,
    raw: &str,
) -> Result<AnalysisResult, ProviderFailure> {
    match task {
        AnalysisTask::Analyze(AnalysisKind::Complexity) => {
            let r: ComplexityResult = decode(provider, raw, "complexity")?;
            require(
                provider,
                non_blank(&r.time_complexity) && non_blank(&r.space_complexity),
                "complexity bounds must not be empty",
            )?;
            Ok(AnalysisResult::Complexity(r))
        }
        AnalysisTask::QuickComplexity => {
            let r: QuickComplexityResult = decode(provider, raw, "quick complexity")?;
            require(
                provider,
                non_blank(&r.time_complexity) && non_blank(&r.space_complexity),
                "complexity bounds must not be empty",
            )?;
            Ok(AnalysisResult::QuickComplexity(r))
        }
        AnalysisTask::ExplainComplexity { .. } => {
            let r: ComplexityExplanationResult = decode(provider, raw, "complexity explanation")?;
            require(provider, non_blank(&r.explanation), "explanation must not be empty")?;
            Ok(AnalysisResult::ComplexityExplanation(r))
        }
        AnalysisTask::Analyze(AnalysisKind::Hints) => {
            let r: HintResult = decode(provider, raw, "hints")?;
            require(
                provider,
                r.hints.iter().any(|h| non_blank(h)),
                "at least one hint is required",
            )?;
            Ok(AnalysisResult::Hints(r))
        }
        AnalysisTask::Analyze(AnalysisKind::Optimization) => {
            let r: OptimizationResult = decode(provider, raw, "optimization")?;
            Ok(AnalysisResult::Optimization(r))
        }
        AnalysisTask::Analyze(AnalysisKind::Debugging) => {
            let r: DebugResult = decode(provider, raw, "debugging")?;
            Ok(AnalysisResult::Debug(r))
        }
    }
}

/// Decodes a completeness-check reply.
///
/// # Errors
/// Permanent [`ProviderFailure`] on malformed JSON or confidence outside `[0, 1]`.
pub fn parse_completeness(provider: &str, raw: &str) -> Result<CompletenessVerdict, ProviderFailure> {
    let v: CompletenessVerdict = decode(provider, raw, "completeness")?;
    require(
        provider,
        v.confidence.is_finite() && (0.0..=1.0).contains(&v.confidence),
        "confidence must be within [0, 1]",
    )?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::FailureKind;
    use crate::model::Severity;

    const HINTS: AnalysisTask = AnalysisTask::Analyze(AnalysisKind::Hints);
    const DEBUG: AnalysisTask = AnalysisTask::Analyze(AnalysisKind::Debugging);

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"hints\":[\"a\"],\"progressive\":true,\"next_steps\":[]}\n```";
        let r = parse_result(&HINTS, "p", raw).unwrap();
        assert!(matches!(r, AnalysisResult::Hints(h) if h.hints == vec!["a".to_string()]));
    }

    #[test]
    fn tolerates_chatter_around_object() {
        let raw = "Sure! Here it is:\n{\"time_complexity\":\"O(n)\",\"space_complexity\":\"O(1)\"}\nHope that helps.";
        let r = parse_result(&AnalysisTask::QuickComplexity, "p", raw).unwrap();
        assert!(matches!(r, AnalysisResult::QuickComplexity(q) if q.time_complexity == "O(n)"));
    }

    #[test]
    fn missing_field_is_permanent() {
        let raw = r#"{"time_complexity":"O(n)","explanation":"x","key_operations":[]}"#;
        let err = parse_result(&AnalysisTask::Analyze(AnalysisKind::Complexity), "openai", raw)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Permanent);
        assert_eq!(err.provider, "openai");
    }

    #[test]
    fn empty_hint_list_is_rejected() {
        let raw = r#"{"hints":[],"progressive":true,"next_steps":[]}"#;
        let err = parse_result(&HINTS, "p", raw).unwrap_err();
        assert_eq!(err.kind, FailureKind::Permanent);
    }

    #[test]
    fn severity_is_strict() {
        let ok = r#"{"issues":[{"line":null,"description":"d","severity":"High"}],"fixes":[],"test_cases":["empty"]}"#;
        match parse_result(&DEBUG, "p", ok).unwrap() {
            AnalysisResult::Debug(d) => {
                assert_eq!(d.issues[0].severity, Severity::High);
                assert_eq!(d.issues[0].line, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        let bad = r#"{"issues":[{"line":3,"description":"d","severity":"critical"}],"fixes":[],"test_cases":[]}"#;
        assert!(parse_result(&DEBUG, "p", bad).is_err());

        let objects_as_cases =
            r#"{"issues":[],"fixes":[],"test_cases":[{"input":"[]","expected":"0"}]}"#;
        assert!(parse_result(&DEBUG, "p", objects_as_cases).is_err());
    }

    #[test]
    fn completeness_confidence_range() {
        let ok = r#"{"is_complete":false,"missing_elements":["return statement"],"confidence":0.9}"#;
        let v = parse_completeness("p", ok).unwrap();
        assert!(!v.is_complete);

        let bad = r#"{"is_complete":true,"missing_elements":[],"confidence":1.5}"#;
        assert!(parse_completeness("p", bad).is_err());
    }

    #[test]
    fn not_json_at_all() {
        let err = parse_result(&HINTS, "p", "I cannot help with that.").unwrap_err();
        assert_eq!(err.kind, FailureKind::Permanent);
        assert!(err.message.contains("malformed hints response"));
    }
}
