//! Persistence port for settlement results and live sentiment.

use async_trait::async_trait;

use crate::domain::{LiveSentiment, MarketId, SettlementCheckpoint};
use crate::error::Result;

/// Write side of the market storage service.
///
/// Storage mirrors the ledger: settlement is authoritative once the ledger
/// records it, so failures here are logged rather than retried.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Mark a market settled and attach the crowd score, market rating, and
    /// every per-opinion score and payout. Repeating the call is a no-op.
    async fn mark_settled(&self, market: &MarketId, checkpoint: &SettlementCheckpoint)
        -> Result<()>;

    /// Attach a live blended sentiment to an active market.
    async fn record_live_sentiment(&self, sentiment: &LiveSentiment) -> Result<()>;
}
