//! Provider clients: one per configured backend.
//!
//! A [`ProviderClient`] turns an analysis task into a prompt, sends it through
//! its [`LlmBackend`] under a per-call timeout and strictly parses the reply.
//! It never retries; that is the gateway's job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ProviderFailure, Result};
use crate::model::{AnalysisResult, AnalysisTask, CompletenessVerdict, Language, Submission};
use crate::parse;
use crate::prompt::{self, Prompt};
use crate::services::{
    anthropic_service::AnthropicService, ollama_service::OllamaService,
    open_ai_service::OpenAiService,
};

/// Result of a single provider invocation.
pub type ProviderOutcome = std::result::Result<AnalysisResult, ProviderFailure>;

/// Raw text completion against one LLM API.
///
/// Implementations classify their own failures (see
/// [`ProviderFailure::from_status`] and [`ProviderFailure::from_transport`]).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Stable provider name for logs and failure records.
    fn name(&self) -> &str;

    /// Model identifier, if meaningful.
    fn model(&self) -> &str {
        ""
    }

    /// Sends `prompt` and returns the model's raw text reply.
    async fn complete(&self, prompt: &Prompt) -> std::result::Result<String, ProviderFailure>;
}

/// Adapter between the gateway and one backend.
#[derive(Clone)]
pub struct ProviderClient {
    backend: Arc<dyn LlmBackend>,
    call_timeout: Duration,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.backend.name())
            .field("model", &self.backend.model())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl ProviderClient {
    pub fn new(backend: Arc<dyn LlmBackend>, call_timeout: Duration) -> Self {
        Self {
            backend,
            call_timeout,
        }
    }

    /// Builds the HTTP backend matching `cfg.provider`.
    ///
    /// # Errors
    /// Configuration errors (missing key, bad endpoint) or client build failures.
    pub fn from_config(cfg: &LlmModelConfig) -> Result<Self> {
        let backend: Arc<dyn LlmBackend> = match cfg.provider {
            LlmProvider::Anthropic => Arc::new(AnthropicService::new(cfg.clone())?),
            LlmProvider::OpenAI => Arc::new(OpenAiService::new(cfg.clone())?),
            LlmProvider::Ollama => Arc::new(OllamaService::new(cfg.clone())?),
        };
        Ok(Self::new(backend, cfg.timeout()))
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Runs one analysis attempt.
    #[instrument(skip_all, fields(provider = %self.backend.name(), task = task.label()))]
    pub async fn analyze(&self, task: &AnalysisTask, sub: &Submission<'_>) -> ProviderOutcome {
        if sub.code.trim().is_empty() {
            return Err(ProviderFailure::permanent(
                self.backend.name(),
                "code must not be empty",
            ));
        }
        let prompt = prompt::build(task, sub);
        let raw = self.call(&prompt).await?;
        parse::parse_result(task, self.backend.name(), &raw)
    }

    /// Asks the model whether `code` is a complete solution.
    #[instrument(skip_all, fields(provider = %self.backend.name()))]
    pub async fn check_completeness(
        &self,
        code: &str,
        language: Language,
    ) -> std::result::Result<CompletenessVerdict, ProviderFailure> {
        let prompt = prompt::completeness(code, language);
        let raw = self.call(&prompt).await?;
        parse::parse_completeness(self.backend.name(), &raw)
    }

    async fn call(&self, prompt: &Prompt) -> std::result::Result<String, ProviderFailure> {
        let started = Instant::now();
        match tokio::time::timeout(self.call_timeout, self.backend.complete(prompt)).await {
            Ok(Ok(text)) => {
                debug!(
                    latency_ms = started.elapsed().as_millis() as u64,
                    reply_len = text.len(),
                    "provider replied"
                );
                Ok(text)
            }
            Ok(Err(failure)) => {
                warn!(
                    kind = %failure.kind,
                    latency_ms = started.elapsed().as_millis() as u64,
                    message = %failure.message,
                    "provider call failed"
                );
                Err(failure)
            }
            Err(_) => {
                warn!(timeout_ms = self.call_timeout.as_millis() as u64, "provider call timed out");
                Err(ProviderFailure::transient(
                    self.backend.name(),
                    format!("call exceeded {:?}", self.call_timeout),
                ))
            }
        }
    }
}
