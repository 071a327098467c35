//! POST /api/check-completeness

use std::sync::Arc;

use analysis_gateway::validation::validate_submission;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::analyze::{
        analyze_request::CompletenessRequest,
        analyze_route::{ensure_valid, parse_language},
    },
};

/// Classifies the code as complete or not without running an analysis.
#[instrument(name = "check_completeness_route", skip_all, fields(language = %body.language))]
pub async fn check_completeness(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CompletenessRequest>,
) -> AppResult<Response> {
    ensure_valid(validate_submission(&body.code, &body.language))?;
    let language = parse_language(&body.language)?;

    let verdict = state.gateway.check_completeness(&body.code, language).await?;
    Ok(ApiResponse::success(verdict).into_response_with_status(StatusCode::OK))
}
