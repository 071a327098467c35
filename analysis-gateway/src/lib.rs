//! AI analysis gateway for interview-prep code submissions.
//!
//! Public entry point: [`AnalysisGateway`]. It takes submitted code, checks
//! whether the solution looks complete, and asks an ordered chain of LLM
//! providers (Anthropic, OpenAI, Ollama) for a structured analysis:
//! complexity, hints, optimization or debugging. Results are cached by
//! request fingerprint; transient provider failures are retried with
//! backoff before failing over to the next provider.
//!
//! # Example
//! ```no_run
//! # use analysis_gateway::{AnalysisGateway, AnalysisKind, AnalysisRequest, GatewayConfig, Language};
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = AnalysisGateway::from_config(GatewayConfig::from_env()?)?;
//! let request = AnalysisRequest::new(
//!     "def add(a, b):\n    return a + b",
//!     Language::Python,
//!     AnalysisKind::Complexity,
//! );
//! let result = gateway.analyze(&request).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(()) }
//! ```

pub mod cache;
pub mod completeness;
pub mod config;
pub mod error_handler;
pub mod gateway;
pub mod health_service;
pub mod model;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod services;
pub mod source_scan;
pub mod telemetry;
pub mod validation;

pub use cache::{CacheStats, ResultCache};
pub use completeness::CompletenessGate;
pub use config::gateway_config::{CacheConfig, GateConfig, GatewayConfig, RetryConfig};
pub use error_handler::{FailureKind, GatewayError, InputError, ProviderFailure};
pub use gateway::AnalysisGateway;
pub use health_service::{HealthService, HealthStatus};
pub use model::{
    AnalysisKind, AnalysisRequest, AnalysisResult, AnalysisTask, CompletenessVerdict, Language,
    ProblemContext,
};
pub use provider::{LlmBackend, ProviderClient};
pub use retry::RetryPolicy;
pub use validation::ValidationReport;
