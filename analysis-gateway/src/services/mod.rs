//! HTTP backends for the supported LLM APIs.
//!
//! All three share [`post_json`], which maps every failure mode onto a
//! [`ProviderFailure`] the same way regardless of vendor.

pub mod anthropic_service;
pub mod ollama_service;
pub mod open_ai_service;

use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    ConfigError, HttpError, ProviderFailure, Result, make_snippet, validate_http_endpoint,
};

/// Reads a rate-limit hint from `retry-after` (seconds) or
/// `retry-after-ms` (milliseconds, rounded up).
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
    };
    if let Some(ms) = read("retry-after-ms") {
        return Some((ms / 1000.0).ceil() as u64);
    }
    read(header::RETRY_AFTER.as_str()).map(|secs| secs.ceil() as u64)
}

/// Checks the config targets `expected` and is otherwise usable.
pub(crate) fn check_config(cfg: &LlmModelConfig, expected: LlmProvider) -> Result<()> {
    if cfg.provider != expected {
        return Err(ConfigError::UnsupportedProvider(format!(
            "{} config passed to {} backend",
            cfg.provider, expected
        ))
        .into());
    }
    validate_http_endpoint("endpoint", cfg.endpoint.trim())?;
    cfg.validate()
}

/// Builds a client with the provider's timeout and default headers.
pub(crate) fn build_client(cfg: &LlmModelConfig, headers: HeaderMap) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(cfg.timeout())
        .connect_timeout(Duration::from_secs(10).min(cfg.timeout()))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Header value from a secret, reported as a config error when invalid.
pub(crate) fn secret_header(
    provider: LlmProvider,
    value: &str,
) -> Result<header::HeaderValue> {
    let mut v = header::HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
        provider: provider.as_str(),
        reason: e.to_string(),
    })?;
    v.set_sensitive(true);
    Ok(v)
}

/// POSTs `body` as JSON and decodes a JSON reply, classifying failures.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    provider: LlmProvider,
    model: &str,
    url: &str,
    body: &B,
) -> std::result::Result<R, ProviderFailure>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let name = provider.as_str();
    let started = Instant::now();
    debug!(provider = name, model, "POST {}", url);

    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ProviderFailure::from_transport(name, &e))?;

    let status = resp.status();
    if !status.is_success() {
        let retry_after = retry_after_secs(resp.headers());
        let text = resp.text().await.unwrap_or_default();
        let http = HttpError {
            status,
            url: url.to_string(),
            snippet: make_snippet(&text),
        };
        error!(
            provider = name,
            model,
            %status,
            snippet = %http.snippet,
            retry_after = ?retry_after,
            latency_ms = started.elapsed().as_millis() as u64,
            "provider returned non-success status"
        );
        return Err(ProviderFailure::from_status(name, &http, retry_after));
    }

    let text = resp
        .text()
        .await
        .map_err(|e| ProviderFailure::from_transport(name, &e))?;

    serde_json::from_str::<R>(&text).map_err(|e| {
        error!(
            provider = name,
            model,
            error = %e,
            latency_ms = started.elapsed().as_millis() as u64,
            "failed to decode provider response"
        );
        ProviderFailure::permanent(
            name,
            format!("failed to decode response: {e}; body: {}", make_snippet(&text)),
        )
    })
}
