//! Splitting the total stake into payout pools.

use serde::{Deserialize, Serialize};

use super::{
    BPS_DENOMINATOR, JACKPOT_BPS, OPINION_POOL_BPS, PREDICTION_POOL_BPS, PROTOCOL_FEE_BPS,
};

/// Pool amounts for one market, all in micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSplit {
    pub total_stake: u64,
    pub protocol_fee: u64,
    /// `total_stake - protocol_fee`.
    pub distributable: u64,
    /// 70% of distributable.
    pub opinion_pool: u64,
    /// 30% of distributable, jackpot included.
    pub prediction_pool: u64,
    /// 20% of the prediction pool.
    pub jackpot_pool: u64,
    /// `prediction_pool - jackpot_pool`.
    pub proportional_prediction_pool: u64,
}

impl PoolSplit {
    #[must_use]
    pub fn from_total_stake(total_stake: u64) -> Self {
        let protocol_fee = apply_bps(total_stake, PROTOCOL_FEE_BPS);
        let distributable = total_stake - protocol_fee;
        let opinion_pool = apply_bps(distributable, OPINION_POOL_BPS);
        let prediction_pool = apply_bps(distributable, PREDICTION_POOL_BPS);
        let jackpot_pool = apply_bps(prediction_pool, JACKPOT_BPS);

        Self {
            total_stake,
            protocol_fee,
            distributable,
            opinion_pool,
            prediction_pool,
            jackpot_pool,
            proportional_prediction_pool: prediction_pool - jackpot_pool,
        }
    }
}

/// `amount * bps / 10_000`, floored.
fn apply_bps(amount: u64, bps: u64) -> u64 {
    (u128::from(amount) * u128::from(bps) / u128::from(BPS_DENOMINATOR)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_five_dollars() {
        let pools = PoolSplit::from_total_stake(5_000_000);
        assert_eq!(pools.protocol_fee, 500_000);
        assert_eq!(pools.distributable, 4_500_000);
        assert_eq!(pools.opinion_pool, 3_150_000);
        assert_eq!(pools.prediction_pool, 1_350_000);
        assert_eq!(pools.jackpot_pool, 270_000);
        assert_eq!(pools.proportional_prediction_pool, 1_080_000);
    }

    #[test]
    fn pools_never_exceed_distributable() {
        for total in [0, 1, 7, 999, 1_234_567, u64::MAX] {
            let p = PoolSplit::from_total_stake(total);
            assert!(p.opinion_pool + p.prediction_pool <= p.distributable);
            assert_eq!(
                p.jackpot_pool + p.proportional_prediction_pool,
                p.prediction_pool
            );
            assert_eq!(p.protocol_fee + p.distributable, total);
        }
    }
}
