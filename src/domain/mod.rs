//! Settlement domain: markets, opinions, jobs, and pure scoring.

pub mod error;
pub mod id;
pub mod job;
pub mod market;
pub mod opinion;
pub mod scoring;
pub mod sentiment;

pub use id::{Authority, JobId, MarketId, OpinionId, StakerId};
pub use job::{ClaimedJob, FailedJob, JobStatus, SettlementJob};
pub use market::{Market, MarketState, MarketSummary};
pub use opinion::{Opinion, ScoredOpinion};
pub use scoring::{CrowdScore, Distribution, JackpotAward, PoolSplit};
pub use sentiment::{Confidence, LiveSentiment, MarketRating};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scoring result saved the first time a market is scored.
///
/// Every later attempt reuses it, so AI scores and the jackpot draw are
/// never repeated for a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementCheckpoint {
    pub market_id: MarketId,
    pub rating: MarketRating,
    pub distribution: Distribution,
    pub created_at: DateTime<Utc>,
}
