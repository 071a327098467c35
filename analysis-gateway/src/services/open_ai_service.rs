//! OpenAI (ChatGPT) backend over Chat Completions.
//!
//! `POST {endpoint}/v1/chat/completions`, non-streaming, with a system and a
//! user message.
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::llm_model_config::{DEFAULT_MAX_TOKENS, LlmModelConfig};
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, ProviderFailure, Result};
use crate::prompt::Prompt;
use crate::provider::LlmBackend;
use crate::services::{build_client, check_config, post_json, secret_header};

/// Thin client for the OpenAI API.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// Config errors for a wrong provider, missing key or bad endpoint;
    /// transport error if the HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        check_config(&cfg, LlmProvider::OpenAI)?;
        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey("openai"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            secret_header(LlmProvider::OpenAI, &format!("Bearer {api_key}"))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let client = build_client(&cfg, headers)?;
        let url_chat = format!("{}/v1/chat/completions", cfg.base_url());

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout().as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Reasoning models only accept the default temperature.
    fn supports_temperature(&self) -> bool {
        let m = self.cfg.model.to_ascii_lowercase();
        !(m.starts_with("gpt-5") || m.starts_with("o1") || m.starts_with("o3") || m.starts_with("o4"))
    }
}

#[async_trait]
impl LlmBackend for OpenAiService {
    fn name(&self) -> &str {
        LlmProvider::OpenAI.as_str()
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    async fn complete(&self, prompt: &Prompt) -> std::result::Result<String, ProviderFailure> {
        let temperature = if self.supports_temperature() {
            Some(self.cfg.effective_temperature(prompt.temperature))
        } else {
            None
        };
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature,
            top_p: self.cfg.top_p,
            max_completion_tokens: self.cfg.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let out: ChatCompletionResponse = post_json(
            &self.client,
            LlmProvider::OpenAI,
            &self.cfg.model,
            &self.url_chat,
            &body,
        )
        .await?;

        out.choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderFailure::permanent(self.name(), "response contained no choices"))
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
