//! Provider configs loaded from environment variables.
//!
//! Each supported backend has a constructor returning a validated
//! [`LlmModelConfig`]; [`provider_chain`] assembles the ordered failover
//! chain the gateway walks.
//!
//! # Environment variables
//!
//! Chain:
//! - `AI_PROVIDERS`       = comma-separated order, overrides the two below
//! - `AI_PROVIDER`        = primary provider (default `claude`)
//! - `FALLBACK_PROVIDER`  = secondary provider (default `openai`, `none` disables)
//!
//! Common:
//! - `LLM_MAX_TOKENS`     = max tokens per response (default 2000)
//! - `LLM_TIMEOUT_SECS`   = per-call timeout (default 30)
//! - `LLM_TEMPERATURE`    = overrides every task temperature (unset keeps them)
//!
//! Anthropic: `CLAUDE_API_KEY` (required), `CLAUDE_MODEL`, `CLAUDE_URL`
//!
//! OpenAI: `OPENAI_API_KEY` (required), `OPENAI_MODEL`, `OPENAI_URL`
//!
//! Ollama: `OLLAMA_URL` or `OLLAMA_PORT` (required), `OLLAMA_MODEL` (required)

use tracing::{info, warn};

use crate::{
    config::{
        VarSource,
        llm_model_config::{DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS, LlmModelConfig},
        llm_provider::LlmProvider,
    },
    error_handler::{
        ConfigError, GatewayError, Result, env_opt, env_opt_u32, env_or, env_parse, must_env,
    },
};

pub const DEFAULT_PRIMARY_PROVIDER: &str = "claude";
pub const DEFAULT_FALLBACK_PROVIDER: &str = "openai";

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_CLAUDE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5-mini-2025-08-07";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint(vars: &dyn VarSource) -> Result<String> {
    if let Some(url) = env_opt(vars, "OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = env_parse::<u16>(vars, "OLLAMA_PORT", "expected u16 (1..=65535)")? {
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Shared limits applied to every provider.
fn apply_common(vars: &dyn VarSource, mut cfg: LlmModelConfig) -> Result<LlmModelConfig> {
    cfg.max_tokens = Some(env_opt_u32(vars, "LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS));
    cfg.timeout_secs = Some(
        env_parse::<u64>(vars, "LLM_TIMEOUT_SECS", "expected u64 seconds")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );
    cfg.temperature = env_parse::<f32>(vars, "LLM_TEMPERATURE", "expected f32 (0.0..=2.0)")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the Anthropic (Claude) config.
///
/// # Env
/// - `CLAUDE_API_KEY` (required)
/// - `CLAUDE_MODEL` (default [`DEFAULT_CLAUDE_MODEL`])
/// - `CLAUDE_URL` (default [`DEFAULT_CLAUDE_URL`])
pub fn config_anthropic(vars: &dyn VarSource) -> Result<LlmModelConfig> {
    let api_key = must_env(vars, "CLAUDE_API_KEY")?;
    let cfg = LlmModelConfig::new(
        LlmProvider::Anthropic,
        env_or(vars, "CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
        env_or(vars, "CLAUDE_URL", DEFAULT_CLAUDE_URL),
    )
    .with_api_key(api_key);
    apply_common(vars, cfg)
}

/// Constructs the OpenAI config.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_MODEL` (default [`DEFAULT_OPENAI_MODEL`])
/// - `OPENAI_URL` (default [`DEFAULT_OPENAI_URL`])
pub fn config_openai(vars: &dyn VarSource) -> Result<LlmModelConfig> {
    let api_key = must_env(vars, "OPENAI_API_KEY")?;
    let cfg = LlmModelConfig::new(
        LlmProvider::OpenAI,
        env_or(vars, "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        env_or(vars, "OPENAI_URL", DEFAULT_OPENAI_URL),
    )
    .with_api_key(api_key);
    apply_common(vars, cfg)
}

/// Constructs the Ollama config.
///
/// # Env
/// - `OLLAMA_URL` or `OLLAMA_PORT` (required)
/// - `OLLAMA_MODEL` (required)
pub fn config_ollama(vars: &dyn VarSource) -> Result<LlmModelConfig> {
    let endpoint = ollama_endpoint(vars)?;
    let model = must_env(vars, "OLLAMA_MODEL")?;
    let cfg = LlmModelConfig::new(LlmProvider::Ollama, model, endpoint);
    apply_common(vars, cfg)
}

/// Builds the config for one provider.
pub fn config_for(vars: &dyn VarSource, provider: LlmProvider) -> Result<LlmModelConfig> {
    match provider {
        LlmProvider::Anthropic => config_anthropic(vars),
        LlmProvider::OpenAI => config_openai(vars),
        LlmProvider::Ollama => config_ollama(vars),
    }
}

/// Resolves the configured provider order, without duplicates.
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for an unknown provider name.
pub fn provider_order(vars: &dyn VarSource) -> Result<Vec<LlmProvider>> {
    let names: Vec<String> = match env_opt(vars, "AI_PROVIDERS") {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => vec![
            env_or(vars, "AI_PROVIDER", DEFAULT_PRIMARY_PROVIDER),
            env_or(vars, "FALLBACK_PROVIDER", DEFAULT_FALLBACK_PROVIDER),
        ],
    };

    let mut order = Vec::with_capacity(names.len());
    for name in names {
        if name.is_empty() || name.eq_ignore_ascii_case("none") {
            continue;
        }
        let provider: LlmProvider = name.parse()?;
        if !order.contains(&provider) {
            order.push(provider);
        }
    }
    Ok(order)
}

/// Builds the ordered provider chain.
///
/// Providers whose credentials or endpoint are missing are skipped with a
/// warning so that a deployment with only one key still works. Malformed
/// values are errors.
///
/// # Errors
/// - [`GatewayError::NoProviders`] when nothing usable remains
/// - any [`ConfigError`] other than a missing variable/key
pub fn provider_chain(vars: &dyn VarSource) -> Result<Vec<LlmModelConfig>> {
    let mut chain = Vec::new();
    for provider in provider_order(vars)? {
        match config_for(vars, provider) {
            Ok(cfg) => chain.push(cfg),
            Err(GatewayError::Config(
                err @ (ConfigError::MissingVar(_) | ConfigError::MissingApiKey(_)),
            )) => {
                warn!(%provider, error = %err, "skipping provider: not configured");
            }
            Err(err) => return Err(err),
        }
    }

    if chain.is_empty() {
        return Err(GatewayError::NoProviders);
    }

    info!(
        providers = ?chain.iter().map(|c| c.provider.as_str()).collect::<Vec<_>>(),
        "provider chain resolved"
    );
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_order_is_claude_then_openai() {
        let order = provider_order(&vars(&[])).unwrap();
        assert_eq!(order, vec![LlmProvider::Anthropic, LlmProvider::OpenAI]);
    }

    #[test]
    fn explicit_list_overrides_and_dedups() {
        let v = vars(&[
            ("AI_PROVIDERS", "ollama, gpt, openai"),
            ("AI_PROVIDER", "claude"),
        ]);
        let order = provider_order(&v).unwrap();
        assert_eq!(order, vec![LlmProvider::Ollama, LlmProvider::OpenAI]);
    }

    #[test]
    fn fallback_can_be_disabled() {
        let v = vars(&[("AI_PROVIDER", "openai"), ("FALLBACK_PROVIDER", "none")]);
        assert_eq!(provider_order(&v).unwrap(), vec![LlmProvider::OpenAI]);
    }

    #[test]
    fn chain_skips_providers_without_credentials() {
        let v = vars(&[("OPENAI_API_KEY", "sk-test"), ("LLM_TIMEOUT_SECS", "5")]);
        let chain = provider_chain(&v).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].provider, LlmProvider::OpenAI);
        assert_eq!(chain[0].model, DEFAULT_OPENAI_MODEL);
        assert_eq!(chain[0].timeout_secs, Some(5));
        assert_eq!(chain[0].max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(chain[0].temperature, None);
    }

    #[test]
    fn temperature_override_from_env() {
        let v = vars(&[("OPENAI_API_KEY", "sk-test"), ("LLM_TEMPERATURE", "0.2")]);
        assert_eq!(config_openai(&v).unwrap().temperature, Some(0.2));

        let out_of_range = vars(&[("OPENAI_API_KEY", "sk-test"), ("LLM_TEMPERATURE", "3")]);
        assert!(config_openai(&out_of_range).is_err());
    }

    #[test]
    fn empty_chain_is_an_error() {
        assert!(matches!(
            provider_chain(&vars(&[])),
            Err(GatewayError::NoProviders)
        ));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let v = vars(&[("AI_PROVIDER", "bard")]);
        assert!(matches!(
            provider_chain(&v),
            Err(GatewayError::Config(ConfigError::UnsupportedProvider(_)))
        ));
    }

    #[test]
    fn ollama_endpoint_from_port() {
        let v = vars(&[
            ("AI_PROVIDERS", "ollama"),
            ("OLLAMA_PORT", "11434"),
            ("OLLAMA_MODEL", "qwen3:14b"),
        ]);
        let chain = provider_chain(&v).unwrap();
        assert_eq!(chain[0].endpoint, "http://localhost:11434");

        let bad = vars(&[("OLLAMA_PORT", "eleven"), ("OLLAMA_MODEL", "m")]);
        assert!(matches!(
            config_ollama(&bad),
            Err(GatewayError::Config(ConfigError::InvalidNumber { var: "OLLAMA_PORT", .. }))
        ));
    }
}
