//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::settlement::SettlementConfig;

/// Settlement config with millisecond backoff so retry tests finish fast.
pub fn settlement(workers: usize) -> SettlementConfig {
    SettlementConfig {
        workers,
        max_attempts: 3,
        initial_backoff_ms: 5,
        backoff_multiplier: 2.0,
        max_backoff_ms: 20,
        poll_interval_ms: 5,
        job_timeout_secs: 5,
    }
}
