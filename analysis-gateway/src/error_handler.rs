//! Unified error handling for `analysis-gateway`.
//!
//! The crate exposes one top-level error type [`GatewayError`] for everything
//! callers of the gateway can observe, plus domain enums for configuration
//! ([`ConfigError`]), request input ([`InputError`]) and health probes
//! ([`HealthError`]). Upstream provider failures are values
//! ([`ProviderFailure`]) rather than errors thrown through the stack: the
//! gateway inspects their [`FailureKind`] to decide between retry, failover
//! and surrender.
//!
//! All messages include the suffix `[Analysis Gateway]` to simplify
//! attribution in logs.

use std::fmt;
use std::str::FromStr;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::VarSource;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Retry-After fallback when a provider signals a rate limit without a hint.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Max number of characters kept from an upstream body for logs/errors.
const SNIPPET_LIMIT: usize = 240;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the gateway.
///
/// Provider failures only surface here once every configured provider has
/// been tried (`AllProvidersExhausted`) or from the standalone completeness
/// check, which has no fail-open fallback.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request itself is unusable; never retried.
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    /// Every provider in the chain failed for this request.
    #[error(
        "[Analysis Gateway] all providers exhausted for {stage} after {attempts} attempt(s); last failure: {last}"
    )]
    AllProvidersExhausted {
        /// Task label (e.g. `complexity`, `hints`).
        stage: &'static str,
        /// Total attempts across all providers.
        attempts: u32,
        /// The failure reported by the last provider tried.
        last: ProviderFailure,
    },

    /// Configuration produced an empty provider chain.
    #[error("[Analysis Gateway] no AI providers are configured")]
    NoProviders,

    /// The standalone completeness check could not reach any provider.
    #[error("[Analysis Gateway] completeness check failed after {attempts} attempt(s): {last}")]
    CompletenessCheck {
        /// Total attempts across all providers.
        attempts: u32,
        /// The failure reported by the last provider tried.
        last: ProviderFailure,
    },

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Underlying HTTP transport error while building a client.
    #[error("[Analysis Gateway] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::AllProvidersExhausted { last, .. }
            | GatewayError::CompletenessCheck { last, .. } => last.is_retryable(),
            _ => false,
        }
    }

    /// Seconds the caller should wait before retrying, when a rate limit
    /// caused the failure.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GatewayError::AllProvidersExhausted { last, .. }
            | GatewayError::CompletenessCheck { last, .. } => match last.kind {
                FailureKind::RateLimited { retry_after_secs } => Some(retry_after_secs),
                _ => None,
            },
            _ => None,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Input errors                                                              */
/* ------------------------------------------------------------------------- */

/// Problems with a caller's request. Mapped to HTTP 400 by the API layer.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Code was empty or whitespace only.
    #[error("[Analysis Gateway] code must not be empty")]
    EmptyCode,

    /// Language is not one the gateway knows how to analyze.
    #[error("[Analysis Gateway] unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Analysis type is not one of complexity/hints/optimization/debugging.
    #[error("[Analysis Gateway] unknown analysis type: {0}")]
    UnknownAnalysisKind(String),

    /// A complexity explanation was requested without the Big-O to explain.
    #[error("[Analysis Gateway] {0} must not be empty")]
    MissingComplexity(&'static str),
}

/* ------------------------------------------------------------------------- */
/* Provider failures                                                         */
/* ------------------------------------------------------------------------- */

/// How a single provider call failed, which drives the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, connection problems, 5xx. Worth retrying with backoff.
    Transient,
    /// Auth errors, 4xx, unparseable output. Retrying cannot help.
    Permanent,
    /// Upstream asked us to slow down for at least `retry_after_secs`.
    RateLimited { retry_after_secs: u64 },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transient => f.write_str("transient"),
            FailureKind::Permanent => f.write_str("permanent"),
            FailureKind::RateLimited { retry_after_secs } => {
                write!(f, "rate limited, retry after {retry_after_secs}s")
            }
        }
    }
}

/// Outcome of one failed provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[Analysis Gateway] {provider} failed ({kind}): {message}")]
pub struct ProviderFailure {
    /// Provider display name (e.g. `anthropic`).
    pub provider: String,
    /// Classification used by the retry policy.
    pub kind: FailureKind,
    /// Human-readable detail, safe to log.
    pub message: String,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, FailureKind::Transient, message)
    }

    pub fn permanent(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, FailureKind::Permanent, message)
    }

    pub fn rate_limited(
        provider: impl Into<String>,
        retry_after_secs: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            provider,
            FailureKind::RateLimited { retry_after_secs },
            message,
        )
    }

    /// Classifies a non-success HTTP status.
    ///
    /// 429 → rate limited (hint or [`DEFAULT_RETRY_AFTER_SECS`]), 5xx and
    /// 408 → transient, everything else → permanent.
    pub fn from_status(
        provider: impl Into<String>,
        http: &HttpError,
        retry_after_secs: Option<u64>,
    ) -> Self {
        let status = http.status;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Self::rate_limited(
                provider,
                retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
                http.to_string(),
            );
        }
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Self::transient(provider, http.to_string());
        }
        let message = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("authentication rejected: {http}")
            }
            _ => http.to_string(),
        };
        Self::permanent(provider, message)
    }

    /// Classifies a `reqwest` transport error. Timeouts, connect failures and
    /// interrupted bodies are transient; request construction bugs are not.
    pub fn from_transport(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::permanent(provider, format!("invalid request: {err}"))
        } else if err.is_timeout() {
            Self::transient(provider, format!("request timed out: {err}"))
        } else {
            Self::transient(provider, format!("transport error: {err}"))
        }
    }

    /// Transient and rate-limited failures may succeed later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, FailureKind::Permanent)
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[Analysis Gateway] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[Analysis Gateway] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`, `OLLAMA_PORT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `AI_PROVIDER`/`FALLBACK_PROVIDER`/`AI_PROVIDERS`.
    #[error("[Analysis Gateway] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Analysis Gateway] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `OLLAMA_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[Analysis Gateway] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range (e.g., `expected 0.0..=1.0`).
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[Analysis Gateway] model name must not be empty")]
    EmptyModel,

    /// A provider that requires an API key was configured without one.
    #[error("[Analysis Gateway] missing API key for {0}")]
    MissingApiKey(&'static str),

    /// API key contained characters that cannot go into an HTTP header.
    #[error("[Analysis Gateway] invalid API key header for {provider}: {reason}")]
    InvalidHeader {
        provider: &'static str,
        reason: String,
    },
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Minimal HTTP error payload shared by provider calls and health probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint is empty or does not start with http/https.
    #[error("[Analysis Gateway] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[Analysis Gateway] {0}")]
    HttpStatus(HttpError),

    /// The probe needs a key that the config does not carry.
    #[error("[Analysis Gateway] missing API key for health probe")]
    MissingApiKey,

    /// Response payload could not be decoded as expected.
    #[error("[Analysis Gateway] decode error: {0}")]
    Decode(String),
}

/// Trims an upstream body to a short, single-line snippet for logs.
pub fn make_snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(SNIPPET_LIMIT).collect()
}

/* ------------------------------------------------------------------------- */
/* Env helpers                                                               */
/* ------------------------------------------------------------------------- */

/// Returns the trimmed value of `name` if it is set and non-empty.
pub fn env_opt(vars: &dyn VarSource, name: &str) -> Option<String> {
    vars.var(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns the value of `name`, or `default` when unset/empty.
pub fn env_or(vars: &dyn VarSource, name: &str, default: &str) -> String {
    env_opt(vars, name).unwrap_or_else(|| default.to_string())
}

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(vars: &dyn VarSource, name: &'static str) -> Result<String> {
    env_opt(vars, name).ok_or_else(|| ConfigError::MissingVar(name).into())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `u32`.
pub fn env_opt_u32(vars: &dyn VarSource, name: &'static str) -> Result<Option<u32>> {
    env_parse(vars, name, "expected u32")
}

/// Parses an optional value of any `FromStr` type (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] with `reason` when parsing fails.
pub fn env_parse<T: FromStr>(
    vars: &dyn VarSource,
    name: &'static str,
    reason: &'static str,
) -> Result<Option<T>> {
    match env_opt(vars, name) {
        Some(v) => v.parse::<T>().map(Some).map_err(|_| {
            GatewayError::from(ConfigError::InvalidNumber { var: name, reason })
        }),
        None => Ok(None),
    }
}

/// Parses an optional boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] for anything else.
pub fn env_flag(vars: &dyn VarSource, name: &'static str) -> Result<Option<bool>> {
    match env_opt(vars, name).map(|v| v.to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidFormat {
                var: name,
                reason: "expected a boolean (true/false)",
            }
            .into()),
        },
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start
/// with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
    detail: &'static str,
) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, detail }.into())
    }
}
