use std::sync::Arc;
use std::time::Instant;

use analysis_gateway::AnalysisGateway;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The gateway owns the provider chain, cache and completeness gate.
    pub gateway: Arc<AnalysisGateway>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gateway: AnalysisGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
