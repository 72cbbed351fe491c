//! Exponential backoff between settlement attempts.

use std::time::Duration;

use crate::error::Error;
use crate::infrastructure::config::settlement::SettlementConfig;

/// Decides whether and when a failed attempt runs again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SettlementConfig::default())
    }
}

impl From<&SettlementConfig> for RetryPolicy {
    fn from(config: &SettlementConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff_ms: config.initial_backoff_ms,
            multiplier: config.backoff_multiplier,
            max_backoff_ms: config.max_backoff_ms,
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let mut delay_ms = self.initial_backoff_ms.min(self.max_backoff_ms);
        for _ in 1..attempt {
            delay_ms = ((delay_ms as f64 * self.multiplier) as u64).min(self.max_backoff_ms);
            if delay_ms == self.max_backoff_ms {
                break;
            }
        }
        Duration::from_millis(delay_ms)
    }

    /// `Some(delay)` if attempt `attempt` failing with `error` earns another
    /// try, `None` if the job should be parked.
    #[must_use]
    pub fn next_delay(&self, attempt: u32, error: &Error) -> Option<Duration> {
        (error.is_retryable() && attempt < self.max_attempts).then(|| self.delay(attempt))
    }
}
