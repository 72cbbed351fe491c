//! Human-readable settlement report for audit logs.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::domain::{MarketId, MarketRating, PoolSplit, SettlementCheckpoint};

/// Decimal places of the settlement currency.
const USDC_SCALE: u32 = 6;

/// Micro-units as a USDC decimal.
#[must_use]
pub fn usdc(amount: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(amount), USDC_SCALE)
}

/// One opinion's line in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ReportRow {
    #[tabled(rename = "Opinion")]
    pub opinion: String,
    #[tabled(rename = "Staker")]
    pub staker: String,
    #[tabled(rename = "Weight")]
    pub weight_score: u8,
    #[tabled(rename = "Prediction")]
    pub prediction_score: u8,
    #[tabled(rename = "AI")]
    pub ai_score: u8,
    #[tabled(rename = "Combined")]
    pub combined_score: u8,
    #[tabled(rename = "Opinion pool", display_with = "display_usdc")]
    pub opinion_payout: u64,
    #[tabled(rename = "Prediction pool", display_with = "display_usdc")]
    pub prediction_payout: u64,
    #[tabled(rename = "Jackpot", display_with = "display_usdc")]
    pub jackpot: u64,
    #[tabled(rename = "Total", display_with = "display_usdc")]
    pub total: u64,
}

fn display_usdc(amount: &u64) -> String {
    usdc(*amount).to_string()
}

/// Outcome of one market's settlement, sorted by total payout descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub market_id: MarketId,
    /// Crowd score in hundredths of a point.
    pub crowd_score: u16,
    pub rating: MarketRating,
    pub pools: PoolSplit,
    pub rows: Vec<ReportRow>,
    /// Truncation dust left in escrow.
    pub undistributed: u64,
}

impl SettlementReport {
    #[must_use]
    pub fn from_checkpoint(checkpoint: &SettlementCheckpoint) -> Self {
        let distribution = &checkpoint.distribution;
        let mut rows: Vec<ReportRow> = distribution
            .opinions
            .iter()
            .map(|o| {
                let jackpot = if o.jackpot_winner {
                    distribution.jackpot_amount()
                } else {
                    0
                };
                ReportRow {
                    opinion: o.id().to_string(),
                    staker: o.staker().to_string(),
                    weight_score: o.weight_score,
                    prediction_score: o.prediction_score,
                    ai_score: o.ai_score,
                    combined_score: o.combined_score,
                    opinion_payout: o.opinion_payout,
                    prediction_payout: o.prediction_payout,
                    jackpot,
                    total: o.payout_amount + jackpot,
                }
            })
            .collect();
        // Stable sort keeps input order among equal totals.
        rows.sort_by(|a, b| b.total.cmp(&a.total));

        Self {
            market_id: checkpoint.market_id.clone(),
            crowd_score: distribution.crowd_score.hundredths(),
            rating: checkpoint.rating.clone(),
            pools: distribution.pools,
            rows,
            undistributed: distribution.undistributed(),
        }
    }

    /// Sum of every row's total.
    #[must_use]
    pub fn total_paid(&self) -> u64 {
        self.rows.iter().map(|r| r.total).sum()
    }
}

impl fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pools = &self.pools;
        writeln!(f, "Settlement report for market {}", self.market_id)?;
        writeln!(
            f,
            "  crowd score {}  sentiment {} ({})",
            Decimal::new(i64::from(self.crowd_score), 2),
            self.rating.score,
            self.rating.confidence,
        )?;
        writeln!(
            f,
            "  total stake {}  fee {}  distributable {}",
            usdc(pools.total_stake),
            usdc(pools.protocol_fee),
            usdc(pools.distributable),
        )?;
        writeln!(
            f,
            "  opinion pool {}  prediction pool {}  jackpot {}",
            usdc(pools.opinion_pool),
            usdc(pools.proportional_prediction_pool),
            usdc(pools.jackpot_pool),
        )?;
        writeln!(
            f,
            "  paid {}  undistributed {}",
            usdc(self.total_paid()),
            usdc(self.undistributed),
        )?;
        if !self.rating.summary.is_empty() {
            writeln!(f, "  summary: {}", self.rating.summary)?;
        }
        if self.rows.is_empty() {
            return writeln!(f, "  no opinions");
        }
        let mut table = Table::new(&self.rows);
        table.with(Style::sharp());
        write!(f, "{table}")
    }
}
