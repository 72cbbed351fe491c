//! Settlement worker pool configuration.

use std::time::Duration;

use serde::Deserialize;

/// Worker pool sizing and retry policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Concurrent settlement workers.
    pub workers: usize,
    /// Deliveries per job before it is parked for the operator.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    /// Idle wait between empty queue claims.
    pub poll_interval_ms: u64,
    /// Upper bound on one settlement attempt.
    pub job_timeout_secs: u64,
}

impl SettlementConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Queue lease for a claimed job. Outlives the job timeout so a live
    /// worker never loses its job.
    #[must_use]
    pub const fn lease(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs.saturating_mul(2).saturating_add(30))
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            max_attempts: 3,
            initial_backoff_ms: 2_000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 60_000,
            poll_interval_ms: 500,
            job_timeout_secs: 300,
        }
    }
}
