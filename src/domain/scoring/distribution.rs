//! Combined scores and the dual-pool payout distribution.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    calculate_crowd_score, calculate_prediction_scores, calculate_weight_scores,
    prediction_distance, prediction_pool_weight, CrowdScore, PoolSplit, AI_LAYER_WEIGHT,
    JACKPOT_ELIGIBLE_PERCENT, NEUTRAL_SCORE, PREDICTION_LAYER_WEIGHT, WEIGHT_LAYER_WEIGHT,
};
use crate::domain::{Opinion, OpinionId, ScoredOpinion, StakerId};

/// The jackpot, paid separately from `payout_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JackpotAward {
    pub opinion_id: OpinionId,
    pub staker: StakerId,
    pub amount: u64,
}

/// Full settlement result for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub crowd_score: CrowdScore,
    pub pools: PoolSplit,
    /// Scored opinions in input order.
    pub opinions: Vec<ScoredOpinion>,
    pub jackpot: Option<JackpotAward>,
}

impl Distribution {
    /// Sum of opinion-pool payouts.
    #[must_use]
    pub fn opinion_total(&self) -> u64 {
        self.opinions.iter().map(|o| o.opinion_payout).sum()
    }

    /// Sum of proportional prediction-pool payouts.
    #[must_use]
    pub fn prediction_total(&self) -> u64 {
        self.opinions.iter().map(|o| o.prediction_payout).sum()
    }

    #[must_use]
    pub fn jackpot_amount(&self) -> u64 {
        self.jackpot.as_ref().map_or(0, |j| j.amount)
    }

    /// Everything paid out, jackpot included.
    #[must_use]
    pub fn total_payout(&self) -> u64 {
        self.opinion_total() + self.prediction_total() + self.jackpot_amount()
    }

    /// Truncation dust left in escrow.
    #[must_use]
    pub fn undistributed(&self) -> u64 {
        self.pools.distributable.saturating_sub(self.total_payout())
    }

    #[must_use]
    pub fn winner(&self) -> Option<&ScoredOpinion> {
        self.opinions.iter().find(|o| o.jackpot_winner)
    }
}

/// `weight*50 + prediction*30 + ai*20`, in basis points (0..=10_000).
#[must_use]
pub fn combined_score_bps(weight: u8, prediction: u8, ai: u8) -> u16 {
    u16::from(weight.min(100)) * WEIGHT_LAYER_WEIGHT
        + u16::from(prediction.min(100)) * PREDICTION_LAYER_WEIGHT
        + u16::from(ai.min(100)) * AI_LAYER_WEIGHT
}

/// Combined score in whole points, half-up.
#[must_use]
pub fn combined_score(bps: u16) -> u8 {
    ((bps.min(10_000) + 50) / 100) as u8
}

/// Split `pool` in proportion to `weights`, flooring each share.
///
/// Falls back to equal shares when every weight is zero.
#[must_use]
pub fn distribute_proportional(pool: u64, weights: &[u128]) -> Vec<u64> {
    if weights.is_empty() {
        return Vec::new();
    }

    let total: u128 = weights.iter().sum();
    if total == 0 {
        let share = pool / weights.len() as u64;
        return vec![share; weights.len()];
    }

    weights
        .iter()
        .map(|&w| (u128::from(pool) * w / total) as u64)
        .collect()
}

/// Mark the closest 20% of predictors (at least one) as jackpot-eligible.
///
/// Ties in distance keep input order.
#[must_use]
pub fn jackpot_eligibility(opinions: &[Opinion], crowd: CrowdScore) -> Vec<bool> {
    let n = opinions.len();
    let mut eligible = vec![false; n];
    if n == 0 {
        return eligible;
    }

    let count = (n * JACKPOT_ELIGIBLE_PERCENT / 100).max(1);
    let mut ranked: Vec<(u32, usize)> = opinions
        .iter()
        .enumerate()
        .map(|(i, op)| (prediction_distance(op.market_prediction, crowd), i))
        .collect();
    ranked.sort_unstable();

    for &(_, i) in ranked.iter().take(count) {
        eligible[i] = true;
    }
    eligible
}

/// Draw one eligible index uniformly at random.
pub fn select_jackpot_winner<R: Rng + ?Sized>(eligible: &[bool], rng: &mut R) -> Option<usize> {
    let candidates: Vec<usize> = eligible
        .iter()
        .enumerate()
        .filter_map(|(i, &e)| e.then_some(i))
        .collect();
    candidates.choose(rng).copied()
}

/// Score every opinion and split the pools.
///
/// `ai_scores` must be in the same order as `opinions`; missing entries are
/// treated as neutral. The jackpot draw is the only use of `rng`.
pub fn compute_distribution<R: Rng + ?Sized>(
    opinions: &[Opinion],
    ai_scores: &[u8],
    total_stake: u64,
    rng: &mut R,
) -> Distribution {
    let crowd_score = calculate_crowd_score(opinions);
    let pools = PoolSplit::from_total_stake(total_stake);
    let weight_scores = calculate_weight_scores(opinions);
    let prediction_scores = calculate_prediction_scores(opinions, crowd_score);

    let backing_weights: Vec<u128> = opinions
        .iter()
        .map(|op| op.net_backing().max(0) as u128)
        .collect();
    let opinion_payouts = distribute_proportional(pools.opinion_pool, &backing_weights);

    let accuracy_weights: Vec<u128> = opinions
        .iter()
        .map(|op| prediction_pool_weight(op.market_prediction, crowd_score))
        .collect();
    let prediction_payouts =
        distribute_proportional(pools.proportional_prediction_pool, &accuracy_weights);

    let eligible = jackpot_eligibility(opinions, crowd_score);
    let winner = select_jackpot_winner(&eligible, rng);

    let scored: Vec<ScoredOpinion> = opinions
        .iter()
        .enumerate()
        .map(|(i, op)| {
            let ai_score = ai_scores.get(i).copied().unwrap_or(NEUTRAL_SCORE).min(100);
            let bps = combined_score_bps(weight_scores[i], prediction_scores[i], ai_score);
            ScoredOpinion {
                opinion: op.clone(),
                net_backing: op.net_backing(),
                weight_score: weight_scores[i],
                ai_score,
                prediction_score: prediction_scores[i],
                combined_score_bps: bps,
                combined_score: combined_score(bps),
                opinion_payout: opinion_payouts[i],
                prediction_payout: prediction_payouts[i],
                payout_amount: opinion_payouts[i] + prediction_payouts[i],
                jackpot_eligible: eligible[i],
                jackpot_winner: winner == Some(i),
            }
        })
        .collect();

    let jackpot = winner.map(|i| JackpotAward {
        opinion_id: opinions[i].id.clone(),
        staker: opinions[i].staker.clone(),
        amount: pools.jackpot_pool,
    });

    Distribution {
        crowd_score,
        pools,
        opinions: scored,
        jackpot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn op(id: &str, stake: u64, score: u8, prediction: u8) -> Opinion {
        Opinion::new(id, format!("staker-{id}"), stake, "text", score, prediction)
    }

    #[test]
    fn combined_score_blends_layers() {
        assert_eq!(combined_score_bps(100, 100, 100), 10_000);
        assert_eq!(combined_score_bps(5, 86, 60), 4_030);
        assert_eq!(combined_score(4_030), 40);
        assert_eq!(combined_score(9_170), 92);
        assert_eq!(combined_score(9_150), 92);
    }

    #[test]
    fn proportional_split_floors_shares() {
        assert_eq!(distribute_proportional(10, &[1, 1, 1]), vec![3, 3, 3]);
        assert_eq!(distribute_proportional(100, &[1, 3]), vec![25, 75]);
    }

    #[test]
    fn zero_weights_fall_back_to_equal_shares() {
        assert_eq!(distribute_proportional(90, &[0, 0, 0]), vec![30, 30, 30]);
        assert!(distribute_proportional(90, &[]).is_empty());
    }

    #[test]
    fn eligibility_takes_closest_fifth() {
        let crowd = CrowdScore::from_hundredths(5000);
        let ops: Vec<Opinion> = (0..10u8).map(|i| op(&i.to_string(), 1, 50, i * 10)).collect();
        let eligible = jackpot_eligibility(&ops, crowd);
        // predictions 50 and 40/60 are closest; 40 comes first in input order
        assert_eq!(eligible.iter().filter(|e| **e).count(), 2);
        assert!(eligible[5]);
        assert!(eligible[4]);
        assert!(!eligible[6]);
    }

    #[test]
    fn eligibility_has_at_least_one_entry() {
        let ops = vec![op("a", 1, 50, 10), op("b", 1, 50, 90)];
        let eligible = jackpot_eligibility(&ops, CrowdScore::from_hundredths(5000));
        assert_eq!(eligible, vec![true, false]);
    }

    #[test]
    fn winner_is_drawn_from_eligible_only() {
        let eligible = vec![false, true, false, true];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let w = select_jackpot_winner(&eligible, &mut rng).unwrap();
            assert!(eligible[w]);
        }
        assert_eq!(select_jackpot_winner(&[false, false], &mut rng), None);
    }

    #[test]
    fn empty_market_has_no_jackpot() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = compute_distribution(&[], &[], 0, &mut rng);
        assert!(dist.opinions.is_empty());
        assert!(dist.jackpot.is_none());
        assert_eq!(dist.total_payout(), 0);
    }

    #[test]
    fn slashed_opinions_get_nothing_from_the_opinion_pool() {
        let ops = vec![
            op("a", 1_000_000, 50, 50).with_peer_totals(1_000_000, 4_000_000),
            op("b", 1_000_000, 50, 50),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let dist = compute_distribution(&ops, &[50, 50], 2_000_000, &mut rng);
        assert_eq!(dist.opinions[0].opinion_payout, 0);
        assert_eq!(dist.opinions[1].opinion_payout, dist.pools.opinion_pool);
    }

    #[test]
    fn exactly_one_winner_and_jackpot_kept_out_of_payout_amount() {
        let ops = vec![op("a", 1, 80, 70), op("b", 2, 40, 50), op("c", 2, 60, 55)];
        let mut rng = StdRng::seed_from_u64(11);
        let dist = compute_distribution(&ops, &[60, 60, 60], 5_000_000, &mut rng);

        let winners: Vec<_> = dist.opinions.iter().filter(|o| o.jackpot_winner).collect();
        assert_eq!(winners.len(), 1);
        assert!(winners[0].jackpot_eligible);
        assert_eq!(
            winners[0].payout_amount,
            winners[0].opinion_payout + winners[0].prediction_payout
        );
        assert_eq!(dist.jackpot_amount(), dist.pools.jackpot_pool);
        assert!(dist.total_payout() <= dist.pools.distributable);
    }

    #[test]
    fn missing_ai_scores_are_neutral() {
        let ops = vec![op("a", 1, 50, 50)];
        let mut rng = StdRng::seed_from_u64(0);
        let dist = compute_distribution(&ops, &[], 10, &mut rng);
        assert_eq!(dist.opinions[0].ai_score, NEUTRAL_SCORE);
    }
}
