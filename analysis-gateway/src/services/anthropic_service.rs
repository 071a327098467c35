//! Anthropic (Claude) backend over the Messages API.
//!
//! `POST {endpoint}/v1/messages` with `x-api-key` and `anthropic-version`
//! headers. The reply's text blocks are concatenated.

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

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Thin client for the Anthropic Messages API.
#[derive(Debug)]
pub struct AnthropicService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_messages: String,
}

impl AnthropicService {
    /// Creates a new [`AnthropicService`].
    ///
    /// # Errors
    /// Config errors for a wrong provider, missing key or bad endpoint;
    /// transport error if the HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        check_config(&cfg, LlmProvider::Anthropic)?;
        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey("anthropic"))?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", secret_header(LlmProvider::Anthropic, api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let client = build_client(&cfg, headers)?;
        let url_messages = format!("{}/v1/messages", cfg.base_url());

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout().as_secs(),
            "AnthropicService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_messages,
        })
    }
}

#[async_trait]
impl LlmBackend for AnthropicService {
    fn name(&self) -> &str {
        LlmProvider::Anthropic.as_str()
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    async fn complete(&self, prompt: &Prompt) -> std::result::Result<String, ProviderFailure> {
        let body = MessagesRequest {
            model: &self.cfg.model,
            max_tokens: self.cfg.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: &prompt.system,
            messages: vec![Message {
                role: "user",
                content: &prompt.user,
            }],
            temperature: Some(self.cfg.effective_temperature(prompt.temperature)),
        };

        let out: MessagesResponse = post_json(
            &self.client,
            LlmProvider::Anthropic,
            &self.cfg.model,
            &self.url_messages,
            &body,
        )
        .await?;

        let text = out
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderFailure::permanent(
                self.name(),
                format!(
                    "response contained no text (stop_reason: {})",
                    out.stop_reason.as_deref().unwrap_or("unknown")
                ),
            ));
        }
        Ok(text)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
