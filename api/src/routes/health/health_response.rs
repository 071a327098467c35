use analysis_gateway::HealthStatus;
use serde::Serialize;

/// Response payload for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when every probed provider answered (or none is probed),
    /// `degraded` when only some did, `unhealthy` when none did.
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// Provider chain in failover order.
    pub providers: Vec<String>,
    pub provider_status: Vec<HealthStatus>,
}

impl HealthResponse {
    pub fn overall(statuses: &[HealthStatus]) -> &'static str {
        let ok = statuses.iter().filter(|s| s.ok).count();
        if ok == statuses.len() {
            "healthy"
        } else if ok > 0 {
            "degraded"
        } else {
            "unhealthy"
        }
    }
}
