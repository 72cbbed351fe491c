//! Handler for the `score` command.
//!
//! Scores a market snapshot without touching the rating service, the ledger,
//! or the database. Every opinion and the market itself get the same fixed
//! AI score, which makes the report reproducible for a given seed.

use std::path::Path;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::warn;

use crate::adapter::inbound::cli::command::ScoreArgs;
use crate::adapter::inbound::cli::output;
use crate::application::settlement::SettlementReport;
use crate::domain::scoring::compute_distribution;
use crate::domain::{
    Confidence, MarketId, MarketRating, Opinion, OpinionId, SettlementCheckpoint, SettlementJob,
    StakerId,
};
use crate::error::Result;

/// Snapshot file layout.
///
/// Peer totals and the escrow total are optional: backing defaults to the
/// author's stake, slashing to zero, and the escrow to the sum of stakes.
/// An escrow total below the sum of stakes is raised to the sum.
#[derive(Debug, Deserialize)]
struct MarketSnapshot {
    market_id: MarketId,
    statement: String,
    #[serde(default)]
    opinions: Vec<OpinionSnapshot>,
    total_stake: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OpinionSnapshot {
    id: OpinionId,
    staker: StakerId,
    stake: u64,
    #[serde(default)]
    text: String,
    opinion_score: u8,
    market_prediction: u8,
    backing_total: Option<u64>,
    #[serde(default)]
    slashing_total: u64,
}

impl MarketSnapshot {
    fn into_job(self) -> Result<SettlementJob> {
        let opinions: Vec<Opinion> = self
            .opinions
            .into_iter()
            .map(|o| {
                let backing = o.backing_total.unwrap_or(o.stake);
                Opinion::new(
                    o.id,
                    o.staker,
                    o.stake,
                    o.text,
                    o.opinion_score,
                    o.market_prediction,
                )
                .with_peer_totals(backing, o.slashing_total)
            })
            .collect();
        let sum: u64 = opinions.iter().map(|o| o.stake).sum();
        let total_stake = match self.total_stake {
            Some(total) if total < sum => {
                warn!(market = %self.market_id, total, sum, "snapshot total below sum of stakes, using the sum");
                sum
            }
            Some(total) => total,
            None => sum,
        };
        Ok(SettlementJob::new(
            self.market_id,
            self.statement,
            opinions,
            total_stake,
        )?)
    }
}

/// Read and validate a snapshot file.
pub fn load_job(path: &Path) -> Result<SettlementJob> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: MarketSnapshot = serde_json::from_str(&content)?;
    snapshot.into_job()
}

/// Score a job with a fixed AI score for every opinion.
#[must_use]
pub fn score_job(job: &SettlementJob, ai_score: u8, seed: Option<u64>) -> SettlementReport {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let opinions = job.opinions();
    let ai_scores = vec![ai_score; opinions.len()];
    let distribution = compute_distribution(opinions, &ai_scores, job.total_stake(), &mut rng);

    let rating = MarketRating {
        score: ai_score,
        confidence: Confidence::from_opinion_count(opinions.len()),
        summary: String::new(),
    };
    let checkpoint = SettlementCheckpoint {
        market_id: job.market_id().clone(),
        rating,
        distribution,
        created_at: Utc::now(),
    };
    SettlementReport::from_checkpoint(&checkpoint)
}

/// Execute the score command.
pub fn execute(args: &ScoreArgs) -> Result<()> {
    let job = load_job(&args.file)?;
    let report = score_job(&job, args.ai_score, args.seed);

    if output::is_json() {
        output::json_output(serde_json::to_value(&report)?);
        return Ok(());
    }

    output::lines(&report.to_string());
    if args.seed.is_none() && report.rows.iter().any(|r| r.jackpot > 0) {
        output::hint("pass --seed to make the jackpot draw repeatable");
    }
    Ok(())
}
