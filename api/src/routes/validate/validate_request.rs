use analysis_gateway::ValidationReport;
use serde::{Deserialize, Serialize};

/// Request body for `POST /api/validate`. Only the fields present are checked.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<String>,
}

/// Per-field reports, keyed by the field name.
#[derive(Debug, Default, Serialize)]
pub struct ValidationResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<ValidationReport>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub validation_results: ValidationResults,
    pub all_valid: bool,
}
