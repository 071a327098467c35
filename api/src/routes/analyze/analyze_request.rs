use analysis_gateway::ProblemContext;
use serde::Deserialize;

/// Request body for `POST /api/analyze`.
///
/// Fields are plain strings so that unknown languages or analysis types
/// reach validation and come back with suggestions instead of a serde error.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub analysis_type: String,
    /// Problem the code solves, when the client knows it.
    #[serde(default)]
    pub problem: Option<ProblemContext>,
}

/// Request body for `POST /api/analyze-complexity-quick`.
#[derive(Debug, Deserialize)]
pub struct QuickComplexityRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub problem: Option<ProblemContext>,
}

/// Request body for `POST /api/explain-complexity`.
#[derive(Debug, Deserialize)]
pub struct ExplainComplexityRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    pub time_complexity: String,
    pub space_complexity: String,
    #[serde(default)]
    pub problem: Option<ProblemContext>,
}

/// Request body for `POST /api/check-completeness`.
#[derive(Debug, Deserialize)]
pub struct CompletenessRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
}
