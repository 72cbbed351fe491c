//! Polling monitor configuration.

use std::time::Duration;

use serde::Deserialize;

/// Intervals and filters for the settlement and live monitors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between scans for closed markets.
    pub settlement_interval_secs: u64,
    /// Seconds between live sentiment passes.
    pub live_interval_secs: u64,
    /// A market rated more recently than this is skipped.
    pub live_debounce_secs: u64,
    /// Active markets with fewer opinions are skipped.
    pub live_min_opinions: usize,
    /// Markets fetched per query page.
    pub page_size: usize,
    pub live_enabled: bool,
}

impl MonitorConfig {
    #[must_use]
    pub const fn settlement_interval(&self) -> Duration {
        Duration::from_secs(self.settlement_interval_secs)
    }

    #[must_use]
    pub const fn live_interval(&self) -> Duration {
        Duration::from_secs(self.live_interval_secs)
    }

    #[must_use]
    pub const fn live_debounce(&self) -> Duration {
        Duration::from_secs(self.live_debounce_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            settlement_interval_secs: 60,
            live_interval_secs: 120,
            live_debounce_secs: 90,
            live_min_opinions: 2,
            page_size: 50,
            live_enabled: true,
        }
    }
}
