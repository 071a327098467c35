//! GET /api/cache/stats, DELETE /api/cache/clear

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
    pub cleared: usize,
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Response {
    let stats = state.gateway.cache_stats().await;
    ApiResponse::success(stats).into_response_with_status(StatusCode::OK)
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Response {
    let cleared = state.gateway.clear_cache().await;
    ApiResponse::success(ClearCacheResponse {
        message: "Cache cleared successfully".to_string(),
        cleared,
    })
    .into_response_with_status(StatusCode::OK)
}
