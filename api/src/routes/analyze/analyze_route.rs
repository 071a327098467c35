//! POST /api/analyze, /api/analyze-complexity-quick, /api/explain-complexity

use std::sync::Arc;

use analysis_gateway::{
    AnalysisKind, AnalysisRequest, GatewayError, Language, ValidationReport,
    validation::{validate_analysis_request, validate_submission},
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Response,
};
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::analyze::analyze_request::{
        AnalyzeRequest, ExplainComplexityRequest, QuickComplexityRequest,
    },
};

/// Rejects the request with every validation issue attached.
pub(crate) fn ensure_valid(report: ValidationReport) -> AppResult<()> {
    if report.is_valid {
        Ok(())
    } else {
        Err(AppError::Validation(report))
    }
}

/// Only called after validation, so a parse failure is still reported as
/// input error rather than panicking.
pub(crate) fn parse_language(language: &str) -> AppResult<Language> {
    language
        .parse::<Language>()
        .map_err(|e| AppError::Gateway(GatewayError::from(e)))
}

/// Handler: POST /api/analyze
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/api/analyze \
///   -H 'content-type: application/json' \
///   -d '{"code":"def f(n):\n    return n * 2","language":"python","analysis_type":"complexity"}'
/// ```
#[instrument(name = "analyze_route", skip_all, fields(language = %body.language, analysis_type = %body.analysis_type))]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> AppResult<Response> {
    ensure_valid(validate_analysis_request(
        &body.code,
        &body.language,
        &body.analysis_type,
    ))?;

    let language = parse_language(&body.language)?;
    let kind = body
        .analysis_type
        .parse::<AnalysisKind>()
        .map_err(GatewayError::from)?;

    let mut request = AnalysisRequest::new(body.code, language, kind);
    if let Some(problem) = body.problem {
        request = request.with_problem(problem);
    }

    let result = state.gateway.analyze(&request).await?;
    info!(incomplete = result.is_incomplete_notice(), "analysis served");
    Ok(ApiResponse::success(result).into_response_with_status(StatusCode::OK))
}

/// Handler: POST /api/analyze-complexity-quick
#[instrument(name = "quick_complexity_route", skip_all, fields(language = %body.language))]
pub async fn analyze_complexity_quick(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QuickComplexityRequest>,
) -> AppResult<Response> {
    ensure_valid(validate_submission(&body.code, &body.language))?;
    let language = parse_language(&body.language)?;

    let result = state
        .gateway
        .analyze_complexity_quick(&body.code, language, body.problem.as_ref())
        .await?;
    Ok(ApiResponse::success(result).into_response_with_status(StatusCode::OK))
}

/// Handler: POST /api/explain-complexity
#[instrument(name = "explain_complexity_route", skip_all, fields(language = %body.language))]
pub async fn explain_complexity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExplainComplexityRequest>,
) -> AppResult<Response> {
    ensure_valid(validate_submission(&body.code, &body.language))?;
    let language = parse_language(&body.language)?;

    let result = state
        .gateway
        .explain_complexity(
            &body.code,
            language,
            body.problem.as_ref(),
            &body.time_complexity,
            &body.space_complexity,
        )
        .await?;
    Ok(ApiResponse::success(result).into_response_with_status(StatusCode::OK))
}
