//! Tuning for the gateway pipeline: retry policy, result cache and
//! completeness gate, plus the provider chain itself.
//!
//! # Environment variables
//!
//! Retry:
//! - `RETRY_MAX_ATTEMPTS`   (default 3, includes the first attempt)
//! - `RETRY_BASE_DELAY_MS`  (default 1000)
//! - `RETRY_MULTIPLIER`     (default 2.0)
//! - `RETRY_JITTER`         (default 0.0, fraction in `[0, 1)`)
//! - `RETRY_MAX_DELAY_MS`   (default unset, no cap)
//!
//! Cache:
//! - `CACHE_CAPACITY`              (default 100, `0` disables caching)
//! - `CACHE_TTL_SECS`              (default 3600)
//! - `CACHE_EXPLANATION_TTL_SECS`  (default 86400)
//!
//! Completeness gate:
//! - `COMPLETENESS_THRESHOLD`      (default 0.7)
//! - `COMPLETENESS_REMOTE_CHECK`   (default false)

use std::time::Duration;

use crate::config::{ProcessEnv, VarSource, default_config::provider_chain};
use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{ConfigError, Result, env_flag, env_parse, validate_range_f32};
use crate::model::ResultKind;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_EXPLANATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_COMPLETENESS_THRESHOLD: f32 = 0.7;

/* ------------------------------------------------------------------------- */
/* Retry                                                                     */
/* ------------------------------------------------------------------------- */

/// Bounded exponential backoff settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts per provider, first one included. Always >= 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    /// Each backoff is scaled by a uniform factor in `[1 - jitter, 1 + jitter]`.
    pub jitter: f64,
    pub max_delay: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: 0.0,
            max_delay: None,
        }
    }
}

impl RetryConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        let d = Self::default();
        let cfg = Self {
            max_attempts: env_parse(vars, "RETRY_MAX_ATTEMPTS", "expected u32")?
                .unwrap_or(d.max_attempts),
            base_delay: env_parse(vars, "RETRY_BASE_DELAY_MS", "expected u64 milliseconds")?
                .map(Duration::from_millis)
                .unwrap_or(d.base_delay),
            multiplier: env_parse(vars, "RETRY_MULTIPLIER", "expected a float")?
                .unwrap_or(d.multiplier),
            jitter: env_parse(vars, "RETRY_JITTER", "expected a float")?.unwrap_or(d.jitter),
            max_delay: env_parse(vars, "RETRY_MAX_DELAY_MS", "expected u64 milliseconds")?
                .map(Duration::from_millis),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_attempts",
                detail: "expected at least 1",
            }
            .into());
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "multiplier",
                detail: "expected a finite value >= 1.0",
            }
            .into());
        }
        if !self.jitter.is_finite() || !(0.0..1.0).contains(&self.jitter) {
            return Err(ConfigError::OutOfRange {
                field: "jitter",
                detail: "expected 0.0..1.0",
            }
            .into());
        }
        Ok(())
    }
}

/* ------------------------------------------------------------------------- */
/* Cache                                                                     */
/* ------------------------------------------------------------------------- */

/// Time-to-live per result kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlTable {
    pub complexity: Duration,
    pub quick_complexity: Duration,
    pub complexity_explanation: Duration,
    pub hints: Duration,
    pub optimization: Duration,
    pub debugging: Duration,
}

impl TtlTable {
    /// Same TTL for every kind.
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            complexity: ttl,
            quick_complexity: ttl,
            complexity_explanation: ttl,
            hints: ttl,
            optimization: ttl,
            debugging: ttl,
        }
    }

    pub fn get(&self, kind: ResultKind) -> Duration {
        match kind {
            ResultKind::Complexity => self.complexity,
            ResultKind::QuickComplexity => self.quick_complexity,
            ResultKind::ComplexityExplanation => self.complexity_explanation,
            ResultKind::Hints => self.hints,
            ResultKind::Optimization => self.optimization,
            ResultKind::Debugging => self.debugging,
        }
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        Self {
            complexity_explanation: DEFAULT_EXPLANATION_TTL,
            ..Self::uniform(DEFAULT_TTL)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Max live entries; `0` disables caching.
    pub capacity: usize,
    pub ttls: TtlTable,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttls: TtlTable::default(),
        }
    }
}

impl CacheConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(capacity) = env_parse(vars, "CACHE_CAPACITY", "expected usize")? {
            cfg.capacity = capacity;
        }
        if let Some(secs) = env_parse::<u64>(vars, "CACHE_TTL_SECS", "expected u64 seconds")? {
            cfg.ttls = TtlTable {
                complexity_explanation: cfg.ttls.complexity_explanation,
                ..TtlTable::uniform(Duration::from_secs(secs))
            };
        }
        if let Some(secs) =
            env_parse::<u64>(vars, "CACHE_EXPLANATION_TTL_SECS", "expected u64 seconds")?
        {
            cfg.ttls.complexity_explanation = Duration::from_secs(secs);
        }
        Ok(cfg)
    }
}

/* ------------------------------------------------------------------------- */
/* Completeness gate                                                         */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Minimum confidence for an "incomplete" verdict to block a request.
    pub threshold: f32,
    /// Ask the provider chain when local heuristics are not conclusive.
    pub remote_check: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COMPLETENESS_THRESHOLD,
            remote_check: false,
        }
    }
}

impl GateConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        let d = Self::default();
        let threshold = env_parse(vars, "COMPLETENESS_THRESHOLD", "expected a float")?
            .unwrap_or(d.threshold);
        validate_range_f32("completeness_threshold", threshold, 0.0, 1.0, "expected 0.0..=1.0")?;
        Ok(Self {
            threshold,
            remote_check: env_flag(vars, "COMPLETENESS_REMOTE_CHECK")?.unwrap_or(d.remote_check),
        })
    }
}

/* ------------------------------------------------------------------------- */
/* Whole gateway                                                             */
/* ------------------------------------------------------------------------- */

/// Everything needed to build an [`AnalysisGateway`](crate::gateway::AnalysisGateway).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Ordered failover chain; first entry is the primary.
    pub providers: Vec<LlmModelConfig>,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub gate: GateConfig,
}

impl GatewayConfig {
    pub fn from_vars(vars: &dyn VarSource) -> Result<Self> {
        Ok(Self {
            providers: provider_chain(vars)?,
            retry: RetryConfig::from_vars(vars)?,
            cache: CacheConfig::from_vars(vars)?,
            gate: GateConfig::from_vars(vars)?,
        })
    }

    /// Loads the whole configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&ProcessEnv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::GatewayError;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_env() {
        let v = vars(&[]);
        assert_eq!(RetryConfig::from_vars(&v).unwrap(), RetryConfig::default());
        let cache = CacheConfig::from_vars(&v).unwrap();
        assert_eq!(cache.capacity, 100);
        assert_eq!(cache.ttls.get(ResultKind::Hints), Duration::from_secs(3600));
        assert_eq!(
            cache.ttls.get(ResultKind::ComplexityExplanation),
            Duration::from_secs(86400)
        );
        let gate = GateConfig::from_vars(&v).unwrap();
        assert_eq!(gate.threshold, 0.7);
        assert!(!gate.remote_check);
    }

    #[test]
    fn cache_ttl_overrides_keep_explanation_separate() {
        let v = vars(&[("CACHE_TTL_SECS", "60"), ("CACHE_CAPACITY", "5")]);
        let cache = CacheConfig::from_vars(&v).unwrap();
        assert_eq!(cache.capacity, 5);
        assert_eq!(cache.ttls.get(ResultKind::Debugging), Duration::from_secs(60));
        assert_eq!(
            cache.ttls.get(ResultKind::ComplexityExplanation),
            DEFAULT_EXPLANATION_TTL
        );

        let v = vars(&[("CACHE_EXPLANATION_TTL_SECS", "10")]);
        let cache = CacheConfig::from_vars(&v).unwrap();
        assert_eq!(
            cache.ttls.get(ResultKind::ComplexityExplanation),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn retry_rejects_nonsense() {
        for (k, val) in [
            ("RETRY_MAX_ATTEMPTS", "0"),
            ("RETRY_MULTIPLIER", "0.5"),
            ("RETRY_JITTER", "1.5"),
        ] {
            let v = vars(&[(k, val)]);
            assert!(
                matches!(
                    RetryConfig::from_vars(&v),
                    Err(GatewayError::Config(ConfigError::OutOfRange { .. }))
                ),
                "{k}={val}"
            );
        }
    }

    #[test]
    fn gate_threshold_range_checked() {
        let v = vars(&[("COMPLETENESS_THRESHOLD", "1.2")]);
        assert!(GateConfig::from_vars(&v).is_err());
        let v = vars(&[
            ("COMPLETENESS_THRESHOLD", "0.9"),
            ("COMPLETENESS_REMOTE_CHECK", "true"),
        ]);
        let gate = GateConfig::from_vars(&v).unwrap();
        assert_eq!(gate.threshold, 0.9);
        assert!(gate.remote_check);
    }
}
