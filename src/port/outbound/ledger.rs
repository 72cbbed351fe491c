//! Ledger port: the program that escrows and releases stakes.
//!
//! Calls are ordered: sentiment, AI scores, layer scores, finalize, then
//! claims. Every call except [`Ledger::claim_payout`] must be made by the
//! designated settlement authority.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Authority, CrowdScore, Distribution, JackpotAward, MarketId, MarketState, OpinionId, StakerId,
};
use crate::error::Result;

/// Ledger view of a market's escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerMarket {
    pub state: MarketState,
    pub total_stake: u64,
}

/// AI quality score for one opinion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionAiScore {
    pub opinion: OpinionId,
    pub score: u8,
}

/// Layer 1 and Layer 2 scores for one opinion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerScores {
    pub opinion: OpinionId,
    pub weight_score: u8,
    pub prediction_score: u8,
}

/// Amount owed to one opinion's staker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutLine {
    pub opinion: OpinionId,
    pub staker: StakerId,
    pub amount: u64,
}

/// Everything finalize needs to fix the distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    pub lines: Vec<PayoutLine>,
    pub jackpot: Option<JackpotAward>,
}

impl PayoutPlan {
    #[must_use]
    pub fn from_distribution(distribution: &Distribution) -> Self {
        Self {
            lines: distribution
                .opinions
                .iter()
                .map(|o| PayoutLine {
                    opinion: o.id().clone(),
                    staker: o.staker().clone(),
                    amount: o.payout_amount,
                })
                .collect(),
            jackpot: distribution.jackpot.clone(),
        }
    }

    /// Sum of all lines plus the jackpot.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.lines.iter().map(|l| l.amount).sum::<u64>()
            + self.jackpot.as_ref().map_or(0, |j| j.amount)
    }
}

/// Amounts fixed by finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeReceipt {
    pub protocol_fee: u64,
    pub distributable: u64,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Escrow state for `market`, or `None` if the ledger has never seen it.
    async fn market(&self, market: &MarketId) -> Result<Option<LedgerMarket>>;

    /// (1) Record market sentiment. Requires `Closed`; moves to `Scored`.
    async fn record_sentiment(
        &self,
        authority: &Authority,
        market: &MarketId,
        score: u8,
        confidence: u8,
        summary_hash: [u8; 32],
    ) -> Result<()>;

    /// (2) Record per-opinion AI scores. Requires `Scored`; overwrites.
    async fn record_ai_scores(
        &self,
        authority: &Authority,
        market: &MarketId,
        scores: &[OpinionAiScore],
    ) -> Result<()>;

    /// (3) Record the crowd score and per-opinion layer scores. Requires
    /// `Scored`; overwrites.
    async fn record_layer_scores(
        &self,
        authority: &Authority,
        market: &MarketId,
        crowd_score: CrowdScore,
        scores: &[LayerScores],
    ) -> Result<()>;

    /// (4) Deduct the protocol fee and fix the payout plan. Requires
    /// `Scored`; moves to `Settled`.
    async fn finalize(
        &self,
        authority: &Authority,
        market: &MarketId,
        plan: &PayoutPlan,
    ) -> Result<FinalizeReceipt>;

    /// (5) Release one opinion's payout to its staker. Returns the amount.
    async fn claim_payout(&self, market: &MarketId, opinion: &OpinionId) -> Result<u64>;

    /// (6) Release the jackpot to the selected winner. Returns the amount.
    async fn claim_jackpot(&self, authority: &Authority, market: &MarketId) -> Result<u64>;
}
