//! Health probes for the configured providers.
//!
//! Each probe lists the provider's models and reports whether the configured
//! model is among them:
//! - Anthropic: `GET {endpoint}/v1/models` with `x-api-key`
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//! - Ollama: `GET {endpoint}/api/tags`
//!
//! [`HealthService::check`] never fails; errors become `ok = false`.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{GatewayError, HealthError, HttpError, make_snippet};
use crate::services::anthropic_service::ANTHROPIC_VERSION;

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Health snapshot for one provider, shaped for a `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.as_str().to_string(),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Reuses one HTTP client for every probe.
#[derive(Debug, Clone)]
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// # Errors
    /// [`GatewayError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, GatewayError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(default_timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        match self.try_probe(cfg).await {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %status.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Probes every config in order.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn try_probe(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, HealthError> {
        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(HealthError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let (url, headers) = match cfg.provider {
            LlmProvider::Anthropic => {
                let key = cfg.api_key.as_deref().ok_or(HealthError::MissingApiKey)?;
                let mut h = HeaderMap::new();
                h.insert("x-api-key", header_value(key)?);
                h.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
                (format!("{}/v1/models", cfg.base_url()), h)
            }
            LlmProvider::OpenAI => {
                let key = cfg.api_key.as_deref().ok_or(HealthError::MissingApiKey)?;
                let mut h = HeaderMap::new();
                h.insert(header::AUTHORIZATION, header_value(&format!("Bearer {key}"))?);
                (format!("{}/v1/models", cfg.base_url()), h)
            }
            LlmProvider::Ollama => (format!("{}/api/tags", cfg.base_url()), HeaderMap::new()),
        };

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);
        debug!(provider = %cfg.provider, %url, "GET health probe");

        let start = Instant::now();
        let resp = self
            .client
            .get(&url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HealthError::Decode(format!("request failed: {e}")))?;
        let latency = start.elapsed().as_millis();

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            }));
        }

        let listed = match resp.json::<ModelList>().await {
            Ok(list) => list.names(),
            Err(e) => {
                warn!(provider = %cfg.provider, error = %e, "model list not decodable; server reachable");
                return Ok(HealthStatus::new(
                    cfg,
                    true,
                    latency,
                    format!("{} is reachable; model list not decodable", cfg.provider),
                ));
            }
        };

        if listed.is_empty() || listed.iter().any(|m| model_matches(m, &cfg.model)) {
            Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                format!("{} is healthy; model is available", cfg.provider),
            ))
        } else {
            Ok(HealthStatus::new(
                cfg,
                false,
                latency,
                format!("{} is up, but model {} is not listed", cfg.provider, cfg.model),
            ))
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, HealthError> {
    let mut v = HeaderValue::from_str(value)
        .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;
    v.set_sensitive(true);
    Ok(v)
}

/// Ollama lists `name:tag`; a bare configured name matches its `:latest`.
fn model_matches(listed: &str, wanted: &str) -> bool {
    listed == wanted || listed.strip_suffix(":latest") == Some(wanted)
}

/// `{ "data": [{ "id" }] }` (Anthropic, OpenAI) or `{ "models": [{ "name" }] }` (Ollama).
#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(alias = "name")]
    id: String,
}

impl ModelList {
    fn names(self) -> Vec<String> {
        self.data
            .into_iter()
            .chain(self.models)
            .map(|m| m.id)
            .collect()
    }
}
