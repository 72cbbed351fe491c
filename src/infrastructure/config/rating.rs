//! Opinion rating limits.

use std::time::Duration;

use serde::Deserialize;

/// Bounds on every rating request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Opinion texts are cut to this many characters before rating.
    pub max_text_chars: usize,
    /// Opinions per rating request.
    pub batch_size: usize,
}

impl RatingConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_text_chars: 500,
            batch_size: 50,
        }
    }
}
