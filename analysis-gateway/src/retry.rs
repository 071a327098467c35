//! Bounded retries with exponential backoff for one provider.
//!
//! Attempt 1 fires immediately. After a transient failure the policy waits
//! `base * multiplier^(attempt-1)` (optionally jittered and capped); after a
//! rate limit it waits at least the advertised delay. Permanent failures
//! return at once.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::gateway_config::RetryConfig;
use crate::error_handler::{FailureKind, ProviderFailure};

/// Outcome of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Success, or the last failure unchanged.
    pub result: Result<T, ProviderFailure>,
    /// Attempts actually made (>= 1).
    pub attempts: u32,
    /// Total time spent sleeping between attempts.
    pub waited: Duration,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    cfg: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(cfg: RetryConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.cfg
    }

    pub fn max_attempts(&self) -> u32 {
        self.cfg.max_attempts.max(1)
    }

    /// Same backoff settings, but never retries.
    pub fn single_attempt(&self) -> Self {
        Self::new(RetryConfig {
            max_attempts: 1,
            ..self.cfg.clone()
        })
    }

    /// Unjittered backoff after the given (1-based) failed attempt, capped
    /// by `max_delay` when set.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.cfg.base_delay.as_secs_f64() * self.cfg.multiplier.powi(exp);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.cfg.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let j = self.cfg.jitter;
        if j <= 0.0 {
            return delay;
        }
        let factor = 1.0 - j + 2.0 * j * rand::random::<f64>();
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
    }

    /// How long to wait after `attempt` failed with `failure`, or `None`
    /// when no further attempt should be made.
    pub fn delay_after(&self, attempt: u32, failure: &ProviderFailure) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        match failure.kind {
            FailureKind::Permanent => None,
            FailureKind::Transient => Some(self.jittered(self.backoff_for(attempt))),
            FailureKind::RateLimited { retry_after_secs } => Some(
                Duration::from_secs(retry_after_secs)
                    .max(self.jittered(self.backoff_for(attempt))),
            ),
        }
    }

    /// Runs `op` until it succeeds, fails permanently or attempts run out.
    pub async fn run<T, F, Fut>(&self, provider: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderFailure>>,
    {
        let mut waited = Duration::ZERO;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    debug!(provider, attempt, "attempt succeeded");
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                        waited,
                    };
                }
                Err(failure) => match self.delay_after(attempt, &failure) {
                    Some(delay) => {
                        warn!(
                            provider,
                            attempt,
                            kind = %failure.kind,
                            delay_ms = delay.as_millis() as u64,
                            "attempt failed; backing off"
                        );
                        tokio::time::sleep(delay).await;
                        waited += delay;
                        attempt += 1;
                    }
                    None => {
                        warn!(
                            provider,
                            attempt,
                            kind = %failure.kind,
                            "giving up on provider"
                        );
                        return RetryOutcome {
                            result: Err(failure),
                            attempts: attempt,
                            waited,
                        };
                    }
                },
            }
        }
    }
}
