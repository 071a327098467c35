//! The analysis gateway: cache, completeness gate, then the provider chain.
//!
//! For every task the gateway
//! 1. rejects empty input,
//! 2. answers from the cache when a fresh entry exists,
//! 3. returns an incomplete-solution notice instead of analysing unfinished
//!    code (hints are exempt); the optional remote confirmation makes a
//!    single attempt per provider so it never multiplies retry latency,
//! 4. walks the providers in order, retrying each under the [`RetryPolicy`]
//!    and failing over on exhaustion or permanent failure,
//! 5. caches and returns the first successful result.

use std::future::Future;

use tracing::{info, instrument, warn};

use crate::cache::{CacheStats, ResultCache, fingerprint, short};
use crate::completeness::CompletenessGate;
use crate::config::gateway_config::GatewayConfig;
use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{GatewayError, InputError, ProviderFailure, Result};
use crate::health_service::{HealthService, HealthStatus};
use crate::model::{
    AnalysisRequest, AnalysisResult, AnalysisTask, CompletenessVerdict, Language, ProblemContext,
    Submission,
};
use crate::provider::ProviderClient;
use crate::retry::RetryPolicy;

/// Why a walk over the provider chain produced nothing.
#[derive(Debug)]
enum ChainError {
    NoProviders,
    Exhausted { attempts: u32, last: ProviderFailure },
}

#[derive(Debug)]
pub struct AnalysisGateway {
    providers: Vec<ProviderClient>,
    retry: RetryPolicy,
    /// Policy for the completeness confirmation that precedes an analysis.
    gate_retry: RetryPolicy,
    cache: ResultCache,
    gate: CompletenessGate,
    health: Option<(HealthService, Vec<LlmModelConfig>)>,
}

impl AnalysisGateway {
    /// Assembles a gateway from already built parts. `providers` are tried
    /// in order.
    pub fn new(
        providers: Vec<ProviderClient>,
        retry: RetryPolicy,
        cache: ResultCache,
        gate: CompletenessGate,
    ) -> Self {
        Self {
            providers,
            gate_retry: retry.single_attempt(),
            retry,
            cache,
            gate,
            health: None,
        }
    }

    /// Builds HTTP-backed providers and health probes from configuration.
    ///
    /// # Errors
    /// [`GatewayError::NoProviders`] for an empty chain, otherwise whatever
    /// building a provider client reports.
    pub fn from_config(cfg: GatewayConfig) -> Result<Self> {
        if cfg.providers.is_empty() {
            return Err(GatewayError::NoProviders);
        }
        let providers = cfg
            .providers
            .iter()
            .map(ProviderClient::from_config)
            .collect::<Result<Vec<_>>>()?;
        let health = HealthService::new(None)?;

        info!(
            providers = ?providers.iter().map(ProviderClient::name).collect::<Vec<_>>(),
            max_attempts = cfg.retry.max_attempts,
            cache_capacity = cfg.cache.capacity,
            completeness_threshold = cfg.gate.threshold,
            remote_completeness = cfg.gate.remote_check,
            "AnalysisGateway initialized"
        );

        Ok(Self::new(
            providers,
            RetryPolicy::new(cfg.retry),
            ResultCache::new(cfg.cache),
            CompletenessGate::new(cfg.gate),
        )
        .with_health(health, cfg.providers))
    }

    pub fn with_health(mut self, service: HealthService, configs: Vec<LlmModelConfig>) -> Self {
        self.health = Some((service, configs));
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(ProviderClient::name).collect()
    }

    /// Runs one of the four main analyses.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.execute(AnalysisTask::Analyze(request.analysis_kind), request.submission())
            .await
    }

    /// Time and space Big-O without an explanation.
    pub async fn analyze_complexity_quick(
        &self,
        code: &str,
        language: Language,
        problem: Option<&ProblemContext>,
    ) -> Result<AnalysisResult> {
        self.execute(
            AnalysisTask::QuickComplexity,
            Submission::new(code, language, problem),
        )
        .await
    }

    /// Explains an already known Big-O for `code`.
    pub async fn explain_complexity(
        &self,
        code: &str,
        language: Language,
        problem: Option<&ProblemContext>,
        time_complexity: &str,
        space_complexity: &str,
    ) -> Result<AnalysisResult> {
        if code.trim().is_empty() {
            return Err(InputError::EmptyCode.into());
        }
        if time_complexity.trim().is_empty() {
            return Err(InputError::MissingComplexity("time_complexity").into());
        }
        if space_complexity.trim().is_empty() {
            return Err(InputError::MissingComplexity("space_complexity").into());
        }
        let task = AnalysisTask::ExplainComplexity {
            time_complexity: time_complexity.trim().to_string(),
            space_complexity: space_complexity.trim().to_string(),
        };
        self.execute(task, Submission::new(code, language, problem))
            .await
    }

    /// Classifies `code` without analysing it.
    ///
    /// A conclusive local block is returned as is; otherwise, when remote
    /// checks are enabled, the provider chain decides.
    pub async fn check_completeness(
        &self,
        code: &str,
        language: Language,
    ) -> Result<CompletenessVerdict> {
        if code.trim().is_empty() {
            return Err(InputError::EmptyCode.into());
        }
        let local = self.gate.inspect(code, language);
        if !self.gate.wants_remote(&local) {
            return Ok(local.verdict);
        }
        match self.remote_completeness(&self.retry, code, language).await {
            Ok(verdict) => Ok(verdict),
            Err(ChainError::NoProviders) => Ok(local.verdict),
            Err(ChainError::Exhausted { attempts, last }) => {
                Err(GatewayError::CompletenessCheck { attempts, last })
            }
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Empties the cache; returns how many entries were dropped.
    pub async fn clear_cache(&self) -> usize {
        let n = self.cache.clear().await;
        info!(dropped = n, "result cache cleared");
        n
    }

    /// Probes every configured provider. Empty when the gateway was built
    /// without health probes.
    pub async fn health(&self) -> Vec<HealthStatus> {
        match &self.health {
            Some((service, configs)) => service.check_many(configs).await,
            None => Vec::new(),
        }
    }

    #[instrument(skip_all, fields(task = task.label(), language = %sub.language))]
    async fn execute(&self, task: AnalysisTask, sub: Submission<'_>) -> Result<AnalysisResult> {
        if sub.code.trim().is_empty() {
            return Err(InputError::EmptyCode.into());
        }

        let fp = fingerprint(&task, &sub);
        if let Some(hit) = self.cache.get(&fp).await {
            info!(fingerprint = short(&fp), "served from cache");
            return Ok(hit);
        }

        if task.requires_complete_solution() {
            let verdict = self.gate_verdict(sub.code, sub.language).await;
            if self.gate.blocks(&verdict) {
                info!(
                    confidence = verdict.confidence,
                    missing = ?verdict.missing_elements,
                    "incomplete solution; analysis skipped"
                );
                return Ok(self.gate.notice(&task, &verdict));
            }
        }

        let task = &task;
        let outcome = self
            .run_chain(&self.retry, |client| async move {
                client.analyze(task, &sub).await
            })
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(ChainError::NoProviders) => return Err(GatewayError::NoProviders),
            Err(ChainError::Exhausted { attempts, last }) => {
                return Err(GatewayError::AllProvidersExhausted {
                    stage: task.label(),
                    attempts,
                    last,
                });
            }
        };

        self.cache.put(&fp, result.clone()).await;
        Ok(result)
    }

    /// Local verdict, confirmed remotely unless it blocks on explicit
    /// markers. A remote verdict replaces the local one; when the remote
    /// check fails the local verdict stands.
    async fn gate_verdict(&self, code: &str, language: Language) -> CompletenessVerdict {
        let local = self.gate.inspect(code, language);
        if !self.gate.wants_remote(&local) {
            return local.verdict;
        }
        match self.remote_completeness(&self.gate_retry, code, language).await {
            Ok(verdict) => {
                if verdict.is_complete != local.verdict.is_complete {
                    info!(
                        local_confidence = local.verdict.confidence,
                        remote_complete = verdict.is_complete,
                        "remote completeness check overruled heuristics"
                    );
                }
                verdict
            }
            Err(ChainError::NoProviders) => local.verdict,
            Err(ChainError::Exhausted { last, .. }) => {
                warn!(
                    provider = %last.provider,
                    error = %last.message,
                    "completeness check failed; keeping local verdict"
                );
                local.verdict
            }
        }
    }

    async fn remote_completeness(
        &self,
        policy: &RetryPolicy,
        code: &str,
        language: Language,
    ) -> std::result::Result<CompletenessVerdict, ChainError> {
        self.run_chain(policy, |client| async move {
            client.check_completeness(code, language).await
        })
        .await
    }

    /// Tries each provider under `policy` until one succeeds.
    async fn run_chain<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        mut call: F,
    ) -> std::result::Result<T, ChainError>
    where
        F: FnMut(ProviderClient) -> Fut,
        Fut: Future<Output = std::result::Result<T, ProviderFailure>>,
    {
        let mut attempts = 0;
        let mut last = None;
        for (idx, client) in self.providers.iter().enumerate() {
            let outcome = policy.run(client.name(), || call(client.clone())).await;
            attempts += outcome.attempts;
            match outcome.result {
                Ok(value) => {
                    info!(
                        provider = client.name(),
                        attempts = outcome.attempts,
                        waited_ms = outcome.waited.as_millis() as u64,
                        "provider succeeded"
                    );
                    return Ok(value);
                }
                Err(failure) => {
                    if idx + 1 < self.providers.len() {
                        warn!(
                            provider = client.name(),
                            kind = %failure.kind,
                            error = %failure.message,
                            "provider failed; failing over"
                        );
                    }
                    last = Some(failure);
                }
            }
        }
        match last {
            Some(last) => Err(ChainError::Exhausted { attempts, last }),
            None => Err(ChainError::NoProviders),
        }
    }
}
