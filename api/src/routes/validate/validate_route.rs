//! POST /api/validate: field checks without touching any provider.

use analysis_gateway::validation::{validate_analysis_kind, validate_code, validate_language};
use axum::{extract::Json, http::StatusCode, response::Response};

use crate::{
    core::http::response_envelope::ApiResponse,
    routes::validate::validate_request::{ValidateRequest, ValidateResponse, ValidationResults},
};

pub async fn validate_input(Json(body): Json<ValidateRequest>) -> Response {
    let language = body.language.as_deref().unwrap_or_default();

    let results = ValidationResults {
        code: body.code.as_deref().map(|code| validate_code(code, language)),
        language: body.language.as_deref().map(validate_language),
        analysis_type: body.analysis_type.as_deref().map(validate_analysis_kind),
    };

    let all_valid = [&results.code, &results.language, &results.analysis_type]
        .into_iter()
        .flatten()
        .all(|r| r.is_valid);

    ApiResponse::success(ValidateResponse {
        validation_results: results,
        all_valid,
    })
    .into_response_with_status(StatusCode::OK)
}
