//! Staked opinions and their scored settlement records.

use serde::{Deserialize, Serialize};

use super::id::{OpinionId, StakerId};

/// A staked opinion as submitted while the market was active.
///
/// Immutable after creation; score fields live on [`ScoredOpinion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opinion {
    pub id: OpinionId,
    pub staker: StakerId,
    /// Stake in micro-units.
    pub stake: u64,
    pub text: String,
    /// Author's own agreement with the statement, 0..=100.
    pub opinion_score: u8,
    /// Author's bet on where the crowd average lands, 0..=100.
    pub market_prediction: u8,
    /// Peer stakes agreeing with this opinion, including the author's own.
    pub backing_total: u64,
    /// Peer stakes disagreeing with this opinion.
    pub slashing_total: u64,
}

impl Opinion {
    /// Create an opinion with no peer activity yet.
    ///
    /// `backing_total` starts at the author's own stake.
    pub fn new(
        id: impl Into<OpinionId>,
        staker: impl Into<StakerId>,
        stake: u64,
        text: impl Into<String>,
        opinion_score: u8,
        market_prediction: u8,
    ) -> Self {
        Self {
            id: id.into(),
            staker: staker.into(),
            stake,
            text: text.into(),
            opinion_score,
            market_prediction,
            backing_total: stake,
            slashing_total: 0,
        }
    }

    /// Replace the peer backing and slashing totals.
    #[must_use]
    pub fn with_peer_totals(mut self, backing_total: u64, slashing_total: u64) -> Self {
        self.backing_total = backing_total;
        self.slashing_total = slashing_total;
        self
    }

    /// Backing minus slashing. May be negative.
    #[must_use]
    pub fn net_backing(&self) -> i128 {
        i128::from(self.backing_total) - i128::from(self.slashing_total)
    }

    /// Weight of this opinion in the crowd average.
    #[must_use]
    pub fn volume_weight(&self) -> u128 {
        u128::from(self.stake) + u128::from(self.backing_total)
    }
}

/// Settlement output for a single opinion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredOpinion {
    pub opinion: Opinion,
    pub net_backing: i128,
    /// Layer 1, 5..=100.
    pub weight_score: u8,
    /// Layer 3, 0..=100.
    pub ai_score: u8,
    /// Layer 2, 0..=100.
    pub prediction_score: u8,
    /// Combined score in basis points, 0..=10_000.
    pub combined_score_bps: u16,
    /// Combined score, 0..=100.
    pub combined_score: u8,
    pub opinion_payout: u64,
    pub prediction_payout: u64,
    /// `opinion_payout + prediction_payout`; excludes any jackpot.
    pub payout_amount: u64,
    pub jackpot_eligible: bool,
    pub jackpot_winner: bool,
}

impl ScoredOpinion {
    #[must_use]
    pub fn id(&self) -> &OpinionId {
        &self.opinion.id
    }

    #[must_use]
    pub fn staker(&self) -> &StakerId {
        &self.opinion.staker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_opinion_is_backed_by_its_own_stake() {
        let op = Opinion::new("op-1", "alice", 2_000_000, "yes", 60, 55);
        assert_eq!(op.backing_total, 2_000_000);
        assert_eq!(op.slashing_total, 0);
        assert_eq!(op.net_backing(), 2_000_000);
        assert_eq!(op.volume_weight(), 4_000_000);
    }

    #[test]
    fn net_backing_goes_negative_when_slashed() {
        let op = Opinion::new("op-1", "alice", 1_000_000, "no", 10, 20)
            .with_peer_totals(1_000_000, 3_500_000);
        assert_eq!(op.net_backing(), -2_500_000);
    }
}
