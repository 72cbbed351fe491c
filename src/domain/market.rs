//! Market records as seen through the query interface.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::MarketId;
use super::opinion::Opinion;

/// Lifecycle of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketState {
    /// Accepting stakes.
    Active,
    /// Past its close time, awaiting settlement.
    Closed,
    /// Market-level sentiment recorded.
    Scored,
    /// Payouts finalized. Terminal.
    Settled,
}

impl MarketState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Scored => "scored",
            Self::Settled => "settled",
        }
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            "scored" => Ok(Self::Scored),
            "settled" => Ok(Self::Settled),
            other => Err(DomainError::UnknownMarketState(other.to_string())),
        }
    }
}

/// Listing view of a market, without opinions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub id: MarketId,
    pub statement: String,
    pub state: MarketState,
    pub closes_at: DateTime<Utc>,
    pub opinion_count: usize,
    pub total_stake: u64,
}

impl MarketSummary {
    /// True once the market's close time has passed.
    #[must_use]
    pub fn is_past_close(&self, now: DateTime<Utc>) -> bool {
        self.closes_at <= now
    }
}

/// A market together with its full opinion set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub statement: String,
    pub state: MarketState,
    pub created_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub total_stake: u64,
    pub opinions: Vec<Opinion>,
}

impl Market {
    #[must_use]
    pub fn summary(&self) -> MarketSummary {
        MarketSummary {
            id: self.id.clone(),
            statement: self.statement.clone(),
            state: self.state,
            closes_at: self.closes_at,
            opinion_count: self.opinions.len(),
            total_stake: self.total_stake,
        }
    }
}
