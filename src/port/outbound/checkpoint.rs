//! Durable per-market scoring checkpoints.

use async_trait::async_trait;

use crate::domain::{MarketId, SettlementCheckpoint};
use crate::error::Result;

/// Store for the first scoring result computed for each market.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, market: &MarketId) -> Result<Option<SettlementCheckpoint>>;

    /// Insert unless a checkpoint already exists; returns the stored one.
    async fn save(&self, checkpoint: SettlementCheckpoint) -> Result<SettlementCheckpoint>;
}
