//! Market-level sentiment: the coarse single-number view kept for display.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::DomainError;
use super::id::MarketId;
use super::scoring::{CrowdScore, NEUTRAL_SCORE};

/// Confidence tier attached to a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Tier derived purely from how many opinions a market holds.
    ///
    /// Fewer than 5 is low, 5 to 14 is medium, 15 or more is high.
    #[must_use]
    pub const fn from_opinion_count(count: usize) -> Self {
        match count {
            0..=4 => Self::Low,
            5..=14 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Ledger encoding: 0 low, 1 medium, 2 high.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl TryFrom<u8> for Confidence {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            other => Err(DomainError::UnknownConfidence(other)),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Market-level rating produced by the summary prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRating {
    /// Sentiment, 0..=100.
    pub score: u8,
    pub confidence: Confidence,
    pub summary: String,
}

impl MarketRating {
    /// Rating used when the rating service cannot be reached.
    #[must_use]
    pub fn neutral(opinion_count: usize) -> Self {
        Self {
            score: NEUTRAL_SCORE,
            confidence: Confidence::from_opinion_count(opinion_count),
            summary: String::new(),
        }
    }

    /// SHA-256 of the summary text, as recorded on the ledger.
    #[must_use]
    pub fn summary_hash(&self) -> [u8; 32] {
        Sha256::digest(self.summary.as_bytes()).into()
    }
}

/// Blended live estimate for an active market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSentiment {
    pub market_id: MarketId,
    pub crowd_score: CrowdScore,
    pub ai_score: u8,
    /// Unweighted average of crowd and AI scores, 0..=100.
    pub blended_score: u8,
    pub confidence: Confidence,
    pub opinion_count: usize,
    pub measured_at: DateTime<Utc>,
}

impl LiveSentiment {
    /// Blend the two signals with equal weight.
    #[must_use]
    pub fn blend(
        market_id: MarketId,
        crowd_score: CrowdScore,
        ai_score: u8,
        opinion_count: usize,
        measured_at: DateTime<Utc>,
    ) -> Self {
        let sum = u32::from(crowd_score.hundredths()) + u32::from(ai_score) * 100;
        // Half-up rounding of sum / 200.
        let blended_score = ((sum + 100) / 200) as u8;
        Self {
            market_id,
            crowd_score,
            ai_score,
            blended_score,
            confidence: Confidence::from_opinion_count(opinion_count),
            opinion_count,
            measured_at,
        }
    }
}
