use analysis_gateway::{FailureKind, GatewayError, ValidationReport};
use axum::{
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("gateway configuration failed: {0}")]
    Config(#[source] GatewayError),

    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    /// Field-level validation failed before any analysis ran.
    #[error("request validation failed")]
    Validation(ValidationReport),

    /// Everything the gateway reports while serving a request.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Gateway(err) => gateway_status(err),
            AppError::Config(_) | AppError::Bind { .. } | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Gateway(err) => gateway_code(err),
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::Validation(report) => report
                .errors
                .iter()
                .map(|issue| ApiErrorDetail {
                    path: Some(issue.field.to_string()),
                    message: Some(issue.message.clone()),
                    hint: Some(issue.suggestion.clone()),
                    examples: issue.examples.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Exhausted chains map by the last failure: rate limit 429, transient 503,
/// permanent 502.
fn gateway_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        GatewayError::AllProvidersExhausted { last, .. }
        | GatewayError::CompletenessCheck { last, .. } => match last.kind {
            FailureKind::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            FailureKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::Permanent => StatusCode::BAD_GATEWAY,
        },
        GatewayError::NoProviders => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn gateway_code(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::InvalidInput(_) => "INVALID_INPUT",
        GatewayError::AllProvidersExhausted { last, .. }
        | GatewayError::CompletenessCheck { last, .. } => match last.kind {
            FailureKind::RateLimited { .. } => "RATE_LIMITED",
            FailureKind::Transient => "PROVIDERS_UNAVAILABLE",
            FailureKind::Permanent => "PROVIDER_ERROR",
        },
        GatewayError::NoProviders => "NO_PROVIDERS",
        _ => "INTERNAL_ERROR",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (retryable, retry_after) = match &self {
            AppError::Gateway(err) => (err.is_retryable(), err.retry_after_secs()),
            _ => (false, None),
        };

        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(retry_after_secs = ?retry_after, error = %self, "providers rate limited");
        }

        let mut response = ApiResponse::<()>::error(self.error_code(), self.to_string(), self.details())
            .with_retry(retryable, retry_after)
            .into_response_with_status(status);

        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
