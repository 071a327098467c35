use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32};

/// Default max tokens per analysis response.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default per-call timeout for provider requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for one LLM backend in the provider chain.
///
/// Each analysis task carries its own sampling temperature in its prompt.
/// A configured `temperature` overrides it for every task sent to this backend.
///
/// # Examples
///
/// ```
/// use analysis_gateway::config::llm_model_config::LlmModelConfig;
/// use analysis_gateway::config::llm_provider::LlmProvider;
///
/// let cfg = LlmModelConfig::new(LlmProvider::OpenAI, "gpt-4o-mini", "https://api.openai.com")
///     .with_api_key("sk-test")
///     .with_timeout_secs(15);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"claude-sonnet-4-5-20250929"`).
    pub model: String,

    /// Base URL of the API (paths are appended by each backend).
    pub endpoint: String,

    /// API key for providers that require authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature override; `None` keeps the task temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Per-call timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    pub fn new(provider: LlmProvider, model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            endpoint: endpoint.into(),
            api_key: None,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: None,
            top_p: None,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Temperature sent to the backend: the configured override, else the task's own.
    pub fn effective_temperature(&self, task_temperature: f32) -> f32 {
        self.temperature.unwrap_or(task_temperature)
    }

    /// Effective per-call timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Endpoint without trailing slashes, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }

    /// Checks the invariants every backend relies on.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] for a blank model name
    /// - [`ConfigError::InvalidFormat`] for a non-http(s) endpoint
    /// - [`ConfigError::MissingApiKey`] when the provider needs a key
    /// - [`ConfigError::OutOfRange`] for temperature/top_p outside their ranges
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if self.provider.requires_api_key()
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingApiKey(self.provider.as_str()).into());
        }
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0, "expected 0.0..=2.0")?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0, "expected 0.0..=1.0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::GatewayError;

    #[test]
    fn validate_rejects_missing_key_for_hosted_providers() {
        let cfg = LlmModelConfig::new(LlmProvider::Anthropic, "claude", "https://api.anthropic.com");
        assert!(matches!(
            cfg.validate(),
            Err(GatewayError::Config(ConfigError::MissingApiKey("anthropic")))
        ));

        let local = LlmModelConfig::new(LlmProvider::Ollama, "llama3", "http://localhost:11434");
        assert!(local.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_endpoint_and_model() {
        let cfg = LlmModelConfig::new(LlmProvider::Ollama, "llama3", "localhost:11434");
        assert!(cfg.validate().is_err());

        let cfg = LlmModelConfig::new(LlmProvider::Ollama, "  ", "http://localhost:11434");
        assert!(matches!(
            cfg.validate(),
            Err(GatewayError::Config(ConfigError::EmptyModel))
        ));
    }

    #[test]
    fn configured_temperature_overrides_task_value() {
        let cfg = LlmModelConfig::new(LlmProvider::Ollama, "m", "http://localhost:11434");
        assert_eq!(cfg.effective_temperature(0.7), 0.7);

        let pinned = cfg.with_temperature(0.0);
        assert_eq!(pinned.effective_temperature(0.7), 0.0);
        assert!(pinned.validate().is_ok());

        assert!(pinned.with_temperature(2.5).validate().is_err());
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let cfg = LlmModelConfig::new(LlmProvider::Ollama, "m", "http://localhost:11434/ ");
        assert_eq!(cfg.base_url(), "http://localhost:11434");
    }
}
