//! Settles one market end to end.
//!
//! Each attempt walks the same steps and skips the ones already done:
//!
//! 1. Refetch the market. Storage reporting `Settled` ends the job.
//! 2. Load the checkpoint, or score the market and store one.
//! 3. Record sentiment if the ledger is still `Closed`.
//! 4. Record AI and layer scores and finalize if the ledger is `Scored`.
//! 5. Claim every payout and the jackpot; repeated claims are tolerated.
//! 6. Mirror the result to storage. Failures here are only logged.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::report::SettlementReport;
use crate::application::scoring::Scorer;
use crate::domain::{
    Authority, MarketId, MarketState, SettlementCheckpoint, SettlementJob,
};
use crate::error::{Error, LedgerError, Result};
use crate::port::outbound::checkpoint::CheckpointStore;
use crate::port::outbound::ledger::{LayerScores, Ledger, OpinionAiScore, PayoutPlan};
use crate::port::outbound::query::MarketQuery;
use crate::port::outbound::store::SettlementStore;

/// Result of a successful settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Settled(Box<SettlementReport>),
    /// Storage already had the market settled; nothing was done.
    AlreadySettled,
}

pub struct SettlementCoordinator {
    scorer: Arc<Scorer>,
    query: Arc<dyn MarketQuery>,
    store: Arc<dyn SettlementStore>,
    ledger: Arc<dyn Ledger>,
    checkpoints: Arc<dyn CheckpointStore>,
    authority: Authority,
    rng: Mutex<StdRng>,
}

impl SettlementCoordinator {
    pub fn new(
        scorer: Arc<Scorer>,
        query: Arc<dyn MarketQuery>,
        store: Arc<dyn SettlementStore>,
        ledger: Arc<dyn Ledger>,
        checkpoints: Arc<dyn CheckpointStore>,
        authority: Authority,
    ) -> Self {
        Self {
            scorer,
            query,
            store,
            ledger,
            checkpoints,
            authority,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seed the jackpot draw.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Settle the market named by `job`.
    ///
    /// # Errors
    ///
    /// Ledger, queue, and checkpoint failures are returned for the worker
    /// pool to classify. Rating failures never surface here.
    pub async fn settle(&self, job: &SettlementJob) -> Result<SettlementOutcome> {
        let market_id = job.market_id();

        let job = match self.query.market(market_id).await? {
            Some(market) if market.state == MarketState::Settled => {
                debug!(market = %market_id, "already settled in storage");
                return Ok(SettlementOutcome::AlreadySettled);
            }
            Some(market) => SettlementJob::from_market(market)?,
            None => {
                warn!(market = %market_id, "market missing from query service, using job snapshot");
                job.clone()
            }
        };

        let ledger_market = self
            .ledger
            .market(market_id)
            .await?
            .ok_or_else(|| LedgerError::UnknownMarket(market_id.to_string()))?;
        if ledger_market.state == MarketState::Active {
            return Err(LedgerError::InvalidState {
                market: market_id.to_string(),
                expected: MarketState::Closed.as_str(),
                actual: MarketState::Active.as_str(),
            }
            .into());
        }

        let checkpoint = match self.checkpoints.load(market_id).await? {
            Some(checkpoint) => {
                debug!(market = %market_id, "resuming from checkpoint");
                checkpoint
            }
            None if ledger_market.state == MarketState::Settled => {
                return Err(Error::NotFound {
                    what: "checkpoint",
                    id: market_id.to_string(),
                });
            }
            None => {
                let total_stake = if job.is_underfunded() {
                    warn!(
                        market = %market_id,
                        stated = job.total_stake(),
                        stake_sum = job.stake_sum(),
                        escrow = ledger_market.total_stake,
                        "stated total below sum of stakes, using ledger escrow"
                    );
                    ledger_market.total_stake
                } else {
                    job.total_stake()
                };
                self.score(&job, total_stake).await?
            }
        };

        let mut state = ledger_market.state;
        if state == MarketState::Closed {
            let rating = &checkpoint.rating;
            self.ledger
                .record_sentiment(
                    &self.authority,
                    market_id,
                    rating.score,
                    rating.confidence.as_u8(),
                    rating.summary_hash(),
                )
                .await?;
            state = MarketState::Scored;
        }

        if checkpoint.distribution.opinions.is_empty() {
            debug!(market = %market_id, "no opinions, nothing to distribute");
        } else {
            if state == MarketState::Scored {
                self.write_scores(market_id, &checkpoint).await?;
            }
            self.claim_all(market_id, &checkpoint).await?;
        }

        if let Err(e) = self.store.mark_settled(market_id, &checkpoint).await {
            warn!(market = %market_id, error = %e, "failed to mirror settlement to storage");
        }

        let report = SettlementReport::from_checkpoint(&checkpoint);
        info!(
            market = %market_id,
            crowd_score = report.crowd_score,
            opinions = report.rows.len(),
            paid = report.total_paid(),
            undistributed = report.undistributed,
            "market settled\n{report}"
        );
        Ok(SettlementOutcome::Settled(Box::new(report)))
    }

    /// Score a market for the first time and store the checkpoint.
    ///
    /// Returns whichever checkpoint the store kept, so a concurrent first
    /// attempt cannot produce a second distribution.
    async fn score(&self, job: &SettlementJob, total_stake: u64) -> Result<SettlementCheckpoint> {
        let statement = job.statement();
        let opinions = job.opinions();

        let rating = self.scorer.rate_market(statement, opinions).await;
        let seed: u64 = self.rng.lock().gen();
        let mut rng = StdRng::seed_from_u64(seed);
        let distribution = self
            .scorer
            .compute_triple_check_scores(statement, opinions, total_stake, &mut rng)
            .await;

        let checkpoint = SettlementCheckpoint {
            market_id: job.market_id().clone(),
            rating,
            distribution,
            created_at: Utc::now(),
        };
        info!(
            market = %checkpoint.market_id,
            crowd_score = %checkpoint.distribution.crowd_score,
            sentiment = checkpoint.rating.score,
            "market scored"
        );
        self.checkpoints.save(checkpoint).await
    }

    async fn write_scores(&self, market: &MarketId, checkpoint: &SettlementCheckpoint) -> Result<()> {
        let distribution = &checkpoint.distribution;
        let ai_scores: Vec<OpinionAiScore> = distribution
            .opinions
            .iter()
            .map(|o| OpinionAiScore {
                opinion: o.id().clone(),
                score: o.ai_score,
            })
            .collect();
        let layer_scores: Vec<LayerScores> = distribution
            .opinions
            .iter()
            .map(|o| LayerScores {
                opinion: o.id().clone(),
                weight_score: o.weight_score,
                prediction_score: o.prediction_score,
            })
            .collect();

        self.ledger
            .record_ai_scores(&self.authority, market, &ai_scores)
            .await?;
        self.ledger
            .record_layer_scores(&self.authority, market, distribution.crowd_score, &layer_scores)
            .await?;
        let receipt = self
            .ledger
            .finalize(&self.authority, market, &PayoutPlan::from_distribution(distribution))
            .await?;
        debug!(
            market = %market,
            fee = receipt.protocol_fee,
            distributable = receipt.distributable,
            "payout plan finalized"
        );
        Ok(())
    }

    async fn claim_all(&self, market: &MarketId, checkpoint: &SettlementCheckpoint) -> Result<()> {
        let distribution = &checkpoint.distribution;
        for opinion in distribution.opinions.iter().filter(|o| o.payout_amount > 0) {
            let claimed = tolerate_claimed(self.ledger.claim_payout(market, opinion.id()).await)?;
            debug!(market = %market, opinion = %opinion.id(), amount = claimed, "payout claimed");
        }
        if let Some(jackpot) = &distribution.jackpot {
            let claimed =
                tolerate_claimed(self.ledger.claim_jackpot(&self.authority, market).await)?;
            debug!(market = %market, opinion = %jackpot.opinion_id, amount = claimed, "jackpot claimed");
        }
        Ok(())
    }
}

/// A claim paid out by an earlier attempt counts as zero this time.
fn tolerate_claimed(result: Result<u64>) -> Result<u64> {
    match result {
        Err(Error::Ledger(LedgerError::AlreadyClaimed { .. })) => Ok(0),
        other => other,
    }
}
