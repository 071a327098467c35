//! Completeness gate: decides whether code is finished enough to analyze.
//!
//! The local heuristics look for placeholders, empty or stub bodies,
//! missing returns, unbalanced brackets and a missing function. Each finding
//! carries a weight; the verdict's confidence grows with the strongest
//! finding and slightly with the number of distinct findings. A verdict only
//! blocks analysis when it is incomplete *and* at or above the configured
//! threshold.
//!
//! Explicit markers (placeholder calls, `pass`-style stubs, broken brackets)
//! are conclusive. Structural findings such as an empty body or a missing
//! `return` may be overruled by a provider when the remote check is on.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::config::gateway_config::GateConfig;
use crate::model::{
    AnalysisResult, AnalysisTask, CompletenessVerdict, IncompleteSolutionNotice, Language,
};
use crate::source_scan;

pub const IMPLEMENTATION_LOGIC: &str = "implementation logic";
pub const RETURN_STATEMENT: &str = "return statement";
pub const FUNCTION_DEFINITION: &str = "function definition";
pub const BALANCED_BRACKETS: &str = "balanced brackets";

/// Confidence reported when nothing suspicious was found.
const CLEAN_CONFIDENCE: f32 = 0.6;
const MAX_CONFIDENCE: f32 = 0.95;
const PER_EXTRA_FINDING: f32 = 0.05;

const W_PLACEHOLDER: f32 = 0.9;
const W_EMPTY_BODY: f32 = 0.9;
/// Empty side-effect method next to other functions, e.g. a no-op `clear()`.
const W_EMPTY_HELPER: f32 = 0.5;
const W_BRACKETS: f32 = 0.75;
const W_MISSING_RETURN: f32 = 0.6;
const W_NO_FUNCTION: f32 = 0.55;
const W_TODO_COMMENT: f32 = 0.5;

lazy_static! {
    /// Placeholder constructs, matched against masked code.
    static ref PLACEHOLDER: Regex = Regex::new(
        r"todo!\s*\(|unimplemented!\s*\(|\bUnsupportedOperationException\b|\bNotImplementedError\b|\bNotImplementedException\b|\bTODO\s*\(|\bfatalError\s*\("
    )
    .unwrap();
    /// Matched against raw code so it also catches message strings.
    static ref NOT_IMPLEMENTED: Regex =
        Regex::new(r"(?i)\bnot\s+(?:yet\s+)?implemented\b").unwrap();
    static ref TODO_MARKER: Regex = Regex::new(r"\b(?:TODO|FIXME|XXX)\b").unwrap();
}

#[derive(Debug, Default)]
struct Findings {
    found: Vec<(&'static str, f32)>,
    conclusive: bool,
}

impl Findings {
    fn add(&mut self, element: &'static str, weight: f32) {
        match self.found.iter_mut().find(|(e, _)| *e == element) {
            Some((_, w)) => *w = w.max(weight),
            None => self.found.push((element, weight)),
        }
    }

    fn add_conclusive(&mut self, element: &'static str, weight: f32) {
        self.add(element, weight);
        self.conclusive = true;
    }

    fn into_assessment(mut self) -> Assessment {
        if self.found.is_empty() {
            return Assessment {
                verdict: CompletenessVerdict::complete(CLEAN_CONFIDENCE),
                conclusive: false,
            };
        }
        self.found.sort_by(|a, b| b.1.total_cmp(&a.1));
        let strongest = self.found[0].1;
        let extra = (self.found.len() - 1) as f32 * PER_EXTRA_FINDING;
        let confidence = ((strongest + extra).min(MAX_CONFIDENCE) * 100.0).round() / 100.0;
        Assessment {
            verdict: CompletenessVerdict {
                is_complete: false,
                missing_elements: self.found.into_iter().map(|(e, _)| e.to_string()).collect(),
                confidence,
            },
            conclusive: self.conclusive,
        }
    }
}

/// Local verdict plus whether it rests on explicit markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: CompletenessVerdict,
    /// Placeholder, stub or bracket evidence; a provider cannot overrule it.
    pub conclusive: bool,
}

/// Runs every local heuristic over `code`.
pub fn heuristic_verdict(code: &str, language: Language) -> CompletenessVerdict {
    assess(code, language).verdict
}

/// Runs every local heuristic over `code`, keeping track of conclusive evidence.
pub fn assess(code: &str, language: Language) -> Assessment {
    let masked = source_scan::mask(code, language);
    let mut findings = Findings::default();

    if PLACEHOLDER.is_match(&masked) || NOT_IMPLEMENTED.is_match(code) {
        findings.add_conclusive(IMPLEMENTATION_LOGIC, W_PLACEHOLDER);
    }

    let functions = source_scan::functions(&masked, language);
    let methods = functions.iter().filter(|f| !f.is_initializer).count();
    for f in functions.iter().filter(|f| !f.is_initializer) {
        if f.has_no_logic() {
            // A lone function or one that owes a value is the solution itself.
            let weight = if f.needs_return || methods == 1 {
                W_EMPTY_BODY
            } else {
                W_EMPTY_HELPER
            };
            if f.is_stub() && weight >= W_EMPTY_BODY {
                findings.add_conclusive(IMPLEMENTATION_LOGIC, weight);
            } else {
                findings.add(IMPLEMENTATION_LOGIC, weight);
            }
        }
        if f.needs_return && !f.has_return {
            findings.add(RETURN_STATEMENT, W_MISSING_RETURN);
        }
    }

    if source_scan::check_brackets(&masked).is_err() {
        findings.add_conclusive(BALANCED_BRACKETS, W_BRACKETS);
    }
    if functions.is_empty() && !source_scan::has_function_definition(&masked, language) {
        findings.add(FUNCTION_DEFINITION, W_NO_FUNCTION);
    }

    // Comments are blanked in `masked`, so look for markers in the raw text.
    if TODO_MARKER.is_match(code) {
        findings.add(IMPLEMENTATION_LOGIC, W_TODO_COMMENT);
    }

    findings.into_assessment()
}

/// Blocking decision plus the user-facing notice.
#[derive(Debug, Clone)]
pub struct CompletenessGate {
    cfg: GateConfig,
}

impl Default for CompletenessGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

impl CompletenessGate {
    pub fn new(cfg: GateConfig) -> Self {
        Self { cfg }
    }

    pub fn threshold(&self) -> f32 {
        self.cfg.threshold
    }

    /// Whether inconclusive local verdicts should be confirmed by a provider.
    pub fn remote_check(&self) -> bool {
        self.cfg.remote_check
    }

    pub fn inspect(&self, code: &str, language: Language) -> Assessment {
        let assessment = assess(code, language);
        let verdict = &assessment.verdict;
        debug!(
            language = %language,
            is_complete = verdict.is_complete,
            confidence = verdict.confidence,
            conclusive = assessment.conclusive,
            missing = ?verdict.missing_elements,
            "completeness heuristics"
        );
        assessment
    }

    pub fn blocks(&self, verdict: &CompletenessVerdict) -> bool {
        !verdict.is_complete && verdict.confidence >= self.cfg.threshold
    }

    /// Whether a provider should be asked before settling on `local`.
    ///
    /// Conclusive blocks stand on their own. Everything else, including a
    /// structural block, is confirmed remotely when the remote check is on.
    pub fn wants_remote(&self, local: &Assessment) -> bool {
        self.cfg.remote_check && !(local.conclusive && self.blocks(&local.verdict))
    }

    /// Notice returned in place of `task`'s analysis.
    pub fn notice(&self, task: &AnalysisTask, verdict: &CompletenessVerdict) -> AnalysisResult {
        AnalysisResult::IncompleteSolution(IncompleteSolutionNotice {
            message: format!(
                "Your solution appears to be incomplete. {} analysis requires a complete solution.",
                task.title()
            ),
            missing_elements: verdict.missing_elements.clone(),
            confidence: verdict.confidence,
            suggestion: "Would you like hints to help complete your solution? \
                         Switch to the 'Hints' option for guidance."
                .to_string(),
            analysis_kind: task.label().to_string(),
        })
    }
}
