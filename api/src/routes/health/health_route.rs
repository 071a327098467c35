//! GET /health: liveness plus a probe of every configured provider.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use tracing::warn;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::health::health_response::HealthResponse,
};

/// Always answers 200 while the process is up; provider trouble shows in
/// `status` and `provider_status`.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let provider_status = state.gateway.health().await;
    let status = HealthResponse::overall(&provider_status);
    if status != "healthy" {
        warn!(status, "provider probes failing");
    }

    ApiResponse::success(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        providers: state
            .gateway
            .provider_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        provider_status,
    })
    .into_response_with_status(StatusCode::OK)
}
