//! HTTP surface of the analysis gateway.
//!
//! Every handler answers with the `{ success, data | error }` envelope from
//! [`core::http::response_envelope`]; gateway errors are mapped to status
//! codes in [`error_handler`].

use std::sync::Arc;

pub mod core;
pub mod error_handler;
mod middleware_layer;
pub mod routes;

use analysis_gateway::{
    AnalysisGateway, GatewayConfig,
    config::ProcessEnv,
    error_handler::env_or,
};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        analyze::{
            analyze_route::{analyze, analyze_complexity_quick, explain_complexity},
            completeness_route::check_completeness,
        },
        cache::cache_route::{cache_stats, clear_cache},
        health::health_route::health,
        validate::validate_route::validate_input,
    },
};

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";

/// All routes, with body rejections rewritten into the JSON envelope.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/analyze-complexity-quick", post(analyze_complexity_quick))
        .route("/api/explain-complexity", post(explain_complexity))
        .route("/api/check-completeness", post(check_completeness))
        .route("/api/validate", post(validate_input))
        .route("/api/cache/stats", get(cache_stats))
        .route("/api/cache/clear", delete(clear_cache))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Builds the gateway from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let addr = env_or(&ProcessEnv, "API_ADDRESS", DEFAULT_API_ADDRESS);

    let config = GatewayConfig::from_env().map_err(AppError::Config)?;
    let gateway = AnalysisGateway::from_config(config).map_err(AppError::Config)?;
    let app = router(Arc::new(AppState::new(gateway)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("API stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed. If the handler cannot be installed the
/// server keeps running until killed.
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
