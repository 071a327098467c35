//! Ollama backend for local models.
//!
//! `POST {endpoint}/api/generate` with `stream=false` and `format="json"`,
//! so the model is constrained to emit a JSON document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ProviderFailure, Result};
use crate::prompt::Prompt;
use crate::provider::LlmBackend;
use crate::services::{build_client, check_config, post_json};

/// Thin client for Ollama.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// Config errors for a wrong provider or bad endpoint; transport error
    /// if the HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        check_config(&cfg, LlmProvider::Ollama)?;
        let client = build_client(&cfg, Default::default())?;
        let url_generate = format!("{}/api/generate", cfg.base_url());

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout().as_secs(),
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }
}

#[async_trait]
impl LlmBackend for OllamaService {
    fn name(&self) -> &str {
        LlmProvider::Ollama.as_str()
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    async fn complete(&self, prompt: &Prompt) -> std::result::Result<String, ProviderFailure> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt);
        let out: GenerateResponse = post_json(
            &self.client,
            LlmProvider::Ollama,
            &self.cfg.model,
            &self.url_generate,
            &body,
        )
        .await?;

        if out.response.trim().is_empty() {
            return Err(ProviderFailure::permanent(
                self.name(),
                "empty `response` from /api/generate",
            ));
        }
        Ok(out.response)
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a Prompt) -> Self {
        Self {
            model: &cfg.model,
            system: &prompt.system,
            prompt: &prompt.user,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: Some(cfg.effective_temperature(prompt.temperature)),
                top_p: cfg.top_p,
                num_predict: cfg.max_tokens,
            },
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/generate`; the generated text is in `response`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
