//! Pure settlement scoring.
//!
//! Three independently scored layers feed one combined score per opinion:
//!
//! - **Layer 1** ([`calculate_weight_scores`]): net peer backing, rescaled
//!   across the opinion set into `5..=100`.
//! - **Layer 2** ([`calculate_prediction_scores`]): how close each author's
//!   market prediction landed to the [`CrowdScore`].
//! - **Layer 3**: externally rated text quality, supplied by the caller.
//!
//! [`compute_distribution`] blends the layers and splits the distributable
//! pool into the opinion pool, the proportional prediction pool, and the
//! jackpot. All arithmetic is integer: amounts in micro-units, ratios in
//! basis points, crowd score in hundredths.

mod crowd;
mod distribution;
mod pool;
mod prediction;
mod weight;

pub use crowd::{calculate_crowd_score, CrowdScore};
pub use distribution::{
    combined_score, combined_score_bps, compute_distribution, distribute_proportional,
    jackpot_eligibility, select_jackpot_winner, Distribution, JackpotAward,
};
pub use pool::PoolSplit;
pub use prediction::{calculate_prediction_scores, prediction_distance, prediction_pool_weight};
pub use weight::calculate_weight_scores;

/// Denominator for all basis-point ratios.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Protocol fee taken from the total stake.
pub const PROTOCOL_FEE_BPS: u64 = 1_000;

/// Share of the distributable pool paid by net backing.
pub const OPINION_POOL_BPS: u64 = 7_000;

/// Share of the distributable pool paid by prediction accuracy.
pub const PREDICTION_POOL_BPS: u64 = 3_000;

/// Share of the prediction pool set aside for the jackpot.
pub const JACKPOT_BPS: u64 = 2_000;

/// Layer weights in the combined score; they sum to 100.
pub const WEIGHT_LAYER_WEIGHT: u16 = 50;
pub const PREDICTION_LAYER_WEIGHT: u16 = 30;
pub const AI_LAYER_WEIGHT: u16 = 20;

/// Lowest Layer 1 score any opinion can receive.
pub const WEIGHT_SCORE_FLOOR: u8 = 5;

/// Highest Layer 1 score.
pub const WEIGHT_SCORE_CEILING: u8 = 100;

/// No-signal default for crowd and AI scores.
pub const NEUTRAL_SCORE: u8 = 50;

/// Percentage of opinions, closest to the crowd, eligible for the jackpot.
pub const JACKPOT_ELIGIBLE_PERCENT: usize = 20;

/// Numerator of the inverse-distance prediction pool weight.
pub const INVERSE_DISTANCE_NUMERATOR: u128 = 1_000_000;

/// Divide rounding half away from zero. `den` must be positive.
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    if num >= 0 {
        (num * 2 + den) / (den * 2)
    } else {
        -((-num * 2 + den) / (den * 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_weights_sum_to_one_hundred() {
        assert_eq!(
            WEIGHT_LAYER_WEIGHT + PREDICTION_LAYER_WEIGHT + AI_LAYER_WEIGHT,
            100
        );
    }

    #[test]
    fn pool_shares_cover_the_distributable_pool() {
        assert_eq!(OPINION_POOL_BPS + PREDICTION_POOL_BPS, BPS_DENOMINATOR);
    }

    #[test]
    fn div_round_is_half_up() {
        assert_eq!(div_round(5, 10), 1);
        assert_eq!(div_round(4, 10), 0);
        assert_eq!(div_round(15, 10), 2);
        assert_eq!(div_round(-5, 10), -1);
        assert_eq!(div_round(-4, 10), 0);
    }
}
