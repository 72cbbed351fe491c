//! Crowd consensus target.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NEUTRAL_SCORE;
use crate::domain::Opinion;

/// Volume-weighted mean agreement, in hundredths of a point (0..=10_000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrowdScore(u16);

impl CrowdScore {
    /// Score used when no opinion carries any weight.
    pub const NEUTRAL: Self = Self(NEUTRAL_SCORE as u16 * 100);

    /// Build from hundredths, clamped to 10_000.
    #[must_use]
    pub const fn from_hundredths(hundredths: u16) -> Self {
        if hundredths > 10_000 {
            Self(10_000)
        } else {
            Self(hundredths)
        }
    }

    #[must_use]
    pub const fn hundredths(self) -> u16 {
        self.0
    }

    /// Nearest whole point, half-up.
    #[must_use]
    pub const fn rounded(self) -> u8 {
        ((self.0 + 50) / 100) as u8
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for CrowdScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Volume-weighted mean of `opinion_score`, weighted by `stake + backing_total`.
///
/// Returns [`CrowdScore::NEUTRAL`] when the total weight is zero.
#[must_use]
pub fn calculate_crowd_score(opinions: &[Opinion]) -> CrowdScore {
    let total_weight: u128 = opinions.iter().map(Opinion::volume_weight).sum();
    if total_weight == 0 {
        return CrowdScore::NEUTRAL;
    }

    let weighted: u128 = opinions
        .iter()
        .map(|op| u128::from(op.opinion_score.min(100)) * 100 * op.volume_weight())
        .sum();

    let mean = (weighted * 2 + total_weight) / (total_weight * 2);
    CrowdScore::from_hundredths(mean.min(10_000) as u16)
}
