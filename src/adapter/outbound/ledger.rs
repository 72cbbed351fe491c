//! In-process ledger enforcing the settlement program's contract.
//!
//! Holds escrow per market and walks the same state machine as the on-chain
//! program: `Active -> Closed -> Scored -> Settled`. Used by `run` when no
//! external ledger is wired in, and by tests as the reference behavior.
//!
//! With a [`LedgerJournal`] attached, every ledger instruction is written
//! through before its effect becomes visible, so a restarted process resumes from the last
//! recorded step instead of re-opening escrow from the market mirror.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::scoring::{BPS_DENOMINATOR, PROTOCOL_FEE_BPS};
use crate::domain::{Authority, CrowdScore, JackpotAward, MarketId, MarketState, OpinionId, StakerId};
use crate::error::{LedgerError, Result};
use crate::port::outbound::ledger::{
    FinalizeReceipt, LayerScores, Ledger, LedgerMarket, OpinionAiScore, PayoutPlan,
};
use crate::port::outbound::query::MarketQuery;

/// Recorded market-level sentiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub score: u8,
    pub confidence: u8,
    pub summary_hash: [u8; 32],
}

/// A payout line after finalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub staker: StakerId,
    pub amount: u64,
    pub claimed: bool,
}

/// Full ledger state for one market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub state: Option<MarketState>,
    pub total_stake: u64,
    /// Funds still held for the market.
    pub escrow: u64,
    pub sentiment: Option<SentimentRecord>,
    pub crowd_score: Option<CrowdScore>,
    pub ai_scores: HashMap<OpinionId, u8>,
    pub layer_scores: HashMap<OpinionId, (u8, u8)>,
    pub protocol_fee: u64,
    pub claims: HashMap<OpinionId, Claim>,
    pub jackpot: Option<(JackpotAward, bool)>,
}

impl LedgerRecord {
    fn state(&self) -> MarketState {
        self.state.unwrap_or(MarketState::Active)
    }

    fn require(&self, market: &MarketId, expected: MarketState) -> std::result::Result<(), LedgerError> {
        if self.state() == expected {
            Ok(())
        } else {
            Err(LedgerError::InvalidState {
                market: market.to_string(),
                expected: expected.as_str(),
                actual: self.state().as_str(),
            })
        }
    }
}

/// Durable storage for ledger records.
pub trait LedgerJournal: Send + Sync {
    /// # Errors
    ///
    /// Returns storage errors.
    fn load(&self, market: &MarketId) -> Result<Option<LedgerRecord>>;

    /// Replace the stored record for `market`.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    fn save(&self, market: &MarketId, record: &LedgerRecord) -> Result<()>;
}

pub struct SimulatedLedger {
    authority: Authority,
    markets: Mutex<HashMap<MarketId, LedgerRecord>>,
    /// Amounts released by this instance.
    balances: Mutex<HashMap<StakerId, u64>>,
    query: Option<Arc<dyn MarketQuery>>,
    journal: Option<Arc<dyn LedgerJournal>>,
}

impl SimulatedLedger {
    pub fn new(authority: Authority) -> Self {
        Self {
            authority,
            markets: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            query: None,
            journal: None,
        }
    }

    /// Persist every record change through `journal` and load unseen
    /// markets from it first.
    #[must_use]
    pub fn with_journal(mut self, journal: Arc<dyn LedgerJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Hydrate escrow for unseen markets from the market query service.
    #[must_use]
    pub fn with_query(mut self, query: Arc<dyn MarketQuery>) -> Self {
        self.query = Some(query);
        self
    }

    /// Open escrow for a market in the `Active` state.
    pub fn open_market(&self, market: MarketId, total_stake: u64) {
        self.insert(market, MarketState::Active, total_stake);
    }

    /// Move an active market to `Closed`.
    ///
    /// # Errors
    ///
    /// Fails if the market is unknown or not active.
    pub fn close_market(&self, market: &MarketId) -> Result<()> {
        let mut markets = self.markets.lock();
        let record = markets
            .get_mut(market)
            .ok_or_else(|| LedgerError::UnknownMarket(market.to_string()))?;
        record.require(market, MarketState::Active)?;
        record.state = Some(MarketState::Closed);
        Ok(())
    }

    /// Copy of a market's ledger state.
    #[must_use]
    pub fn record(&self, market: &MarketId) -> Option<LedgerRecord> {
        self.markets.lock().get(market).cloned()
    }

    /// Total released to `staker` across all markets.
    #[must_use]
    pub fn balance(&self, staker: &StakerId) -> u64 {
        self.balances.lock().get(staker).copied().unwrap_or(0)
    }

    fn insert(&self, market: MarketId, state: MarketState, total_stake: u64) {
        self.markets.lock().insert(
            market,
            LedgerRecord {
                state: Some(state),
                total_stake,
                escrow: total_stake,
                ..LedgerRecord::default()
            },
        );
    }

    fn authorize(&self, caller: &Authority) -> std::result::Result<(), LedgerError> {
        if caller == &self.authority {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
            })
        }
    }

    async fn hydrate(&self, market: &MarketId) -> Result<()> {
        if self.markets.lock().contains_key(market) {
            return Ok(());
        }
        if let Some(journal) = &self.journal {
            if let Some(record) = journal.load(market)? {
                debug!(market = %market, state = %record.state(), "resumed ledger record from journal");
                self.markets.lock().entry(market.clone()).or_insert(record);
                return Ok(());
            }
        }
        let Some(query) = &self.query else {
            return Ok(());
        };
        if let Some(found) = query.market(market).await? {
            let state = match found.state {
                MarketState::Active => MarketState::Active,
                MarketState::Closed | MarketState::Scored => MarketState::Closed,
                MarketState::Settled => MarketState::Settled,
            };
            debug!(market = %market, state = %state, "hydrated escrow from query service");
            self.markets
                .lock()
                .entry(market.clone())
                .or_insert_with(|| LedgerRecord {
                    state: Some(state),
                    total_stake: found.total_stake,
                    escrow: found.total_stake,
                    ..LedgerRecord::default()
                });
        }
        Ok(())
    }

    /// Apply `f` to a copy of the record, journal the copy, then publish it.
    /// A failed journal write leaves the record unchanged.
    fn with_record<T>(
        &self,
        market: &MarketId,
        f: impl FnOnce(&mut LedgerRecord) -> std::result::Result<T, LedgerError>,
    ) -> Result<T> {
        let mut markets = self.markets.lock();
        let record = markets
            .get_mut(market)
            .ok_or_else(|| LedgerError::UnknownMarket(market.to_string()))?;
        let mut next = record.clone();
        let value = f(&mut next)?;
        if let Some(journal) = &self.journal {
            journal.save(market, &next)?;
        }
        *record = next;
        Ok(value)
    }

    fn credit(&self, staker: &StakerId, amount: u64) {
        *self.balances.lock().entry(staker.clone()).or_insert(0) += amount;
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    async fn market(&self, market: &MarketId) -> Result<Option<LedgerMarket>> {
        self.hydrate(market).await?;
        Ok(self.markets.lock().get(market).map(|r| LedgerMarket {
            state: r.state(),
            total_stake: r.total_stake,
        }))
    }

    async fn record_sentiment(
        &self,
        authority: &Authority,
        market: &MarketId,
        score: u8,
        confidence: u8,
        summary_hash: [u8; 32],
    ) -> Result<()> {
        self.authorize(authority)?;
        if score > 100 {
            return Err(LedgerError::InvalidScore(score).into());
        }
        if confidence > 2 {
            return Err(LedgerError::InvalidConfidence(confidence).into());
        }
        self.hydrate(market).await?;
        self.with_record(market, |r| {
            r.require(market, MarketState::Closed)?;
            r.sentiment = Some(SentimentRecord {
                score,
                confidence,
                summary_hash,
            });
            r.state = Some(MarketState::Scored);
            Ok(())
        })
    }

    async fn record_ai_scores(
        &self,
        authority: &Authority,
        market: &MarketId,
        scores: &[OpinionAiScore],
    ) -> Result<()> {
        self.authorize(authority)?;
        if let Some(bad) = scores.iter().find(|s| s.score > 100) {
            return Err(LedgerError::InvalidScore(bad.score).into());
        }
        self.with_record(market, |r| {
            r.require(market, MarketState::Scored)?;
            for s in scores {
                r.ai_scores.insert(s.opinion.clone(), s.score);
            }
            Ok(())
        })
    }

    async fn record_layer_scores(
        &self,
        authority: &Authority,
        market: &MarketId,
        crowd_score: CrowdScore,
        scores: &[LayerScores],
    ) -> Result<()> {
        self.authorize(authority)?;
        if let Some(bad) = scores
            .iter()
            .find(|s| s.weight_score > 100 || s.prediction_score > 100)
        {
            return Err(LedgerError::InvalidScore(bad.weight_score.max(bad.prediction_score)).into());
        }
        self.with_record(market, |r| {
            r.require(market, MarketState::Scored)?;
            r.crowd_score = Some(crowd_score);
            for s in scores {
                r.layer_scores
                    .insert(s.opinion.clone(), (s.weight_score, s.prediction_score));
            }
            Ok(())
        })
    }

    async fn finalize(
        &self,
        authority: &Authority,
        market: &MarketId,
        plan: &PayoutPlan,
    ) -> Result<FinalizeReceipt> {
        self.authorize(authority)?;
        let receipt = self.with_record(market, |r| {
            r.require(market, MarketState::Scored)?;
            if r.total_stake == 0 {
                return Err(LedgerError::EmptyPrizePool(market.to_string()));
            }

            let protocol_fee = (u128::from(r.total_stake) * u128::from(PROTOCOL_FEE_BPS)
                / u128::from(BPS_DENOMINATOR)) as u64;
            let distributable = r.total_stake - protocol_fee;
            let planned = plan.total();
            if planned > distributable {
                return Err(LedgerError::Overdraft {
                    planned,
                    distributable,
                });
            }

            r.protocol_fee = protocol_fee;
            r.escrow = r.escrow.saturating_sub(protocol_fee);
            r.claims = plan
                .lines
                .iter()
                .map(|l| {
                    (
                        l.opinion.clone(),
                        Claim {
                            staker: l.staker.clone(),
                            amount: l.amount,
                            claimed: false,
                        },
                    )
                })
                .collect();
            r.jackpot = plan.jackpot.clone().map(|j| (j, false));
            r.state = Some(MarketState::Settled);

            Ok(FinalizeReceipt {
                protocol_fee,
                distributable,
            })
        })?;
        debug!(market = %market, fee = receipt.protocol_fee, "ledger finalized");
        Ok(receipt)
    }

    async fn claim_payout(&self, market: &MarketId, opinion: &OpinionId) -> Result<u64> {
        let (staker, amount) = self.with_record(market, |r| {
            r.require(market, MarketState::Settled)?;
            let claim = r
                .claims
                .get_mut(opinion)
                .filter(|c| c.amount > 0)
                .ok_or_else(|| LedgerError::NothingToClaim {
                    market: market.to_string(),
                    what: format!("opinion {opinion}"),
                })?;
            if claim.claimed {
                return Err(LedgerError::AlreadyClaimed {
                    market: market.to_string(),
                    what: format!("opinion {opinion}"),
                });
            }
            claim.claimed = true;
            let paid = (claim.staker.clone(), claim.amount);
            r.escrow = r.escrow.saturating_sub(paid.1);
            Ok(paid)
        })?;
        self.credit(&staker, amount);
        Ok(amount)
    }

    async fn claim_jackpot(&self, authority: &Authority, market: &MarketId) -> Result<u64> {
        self.authorize(authority)?;
        let (staker, amount) = self.with_record(market, |r| {
            r.require(market, MarketState::Settled)?;
            let (award, claimed) = r.jackpot.as_mut().ok_or_else(|| {
                LedgerError::NothingToClaim {
                    market: market.to_string(),
                    what: "jackpot".into(),
                }
            })?;
            if *claimed {
                return Err(LedgerError::AlreadyClaimed {
                    market: market.to_string(),
                    what: "jackpot".into(),
                });
            }
            *claimed = true;
            let paid = (award.staker.clone(), award.amount);
            r.escrow = r.escrow.saturating_sub(paid.1);
            Ok(paid)
        })?;
        self.credit(&staker, amount);
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::port::outbound::ledger::PayoutLine;
    use crate::testkit::memory::MemoryLedgerJournal;

    fn authority() -> Authority {
        Authority::new("settler")
    }

    fn closed_ledger(total: u64) -> (SimulatedLedger, MarketId) {
        let ledger = SimulatedLedger::new(authority());
        let id = MarketId::new("m-1");
        ledger.open_market(id.clone(), total);
        ledger.close_market(&id).unwrap();
        (ledger, id)
    }

    fn plan(amounts: &[u64], jackpot: u64) -> PayoutPlan {
        PayoutPlan {
            lines: amounts
                .iter()
                .enumerate()
                .map(|(i, &amount)| PayoutLine {
                    opinion: OpinionId::new(format!("o{i}")),
                    staker: StakerId::new(format!("s{i}")),
                    amount,
                })
                .collect(),
            jackpot: (jackpot > 0).then(|| JackpotAward {
                opinion_id: OpinionId::new("o0"),
                staker: StakerId::new("s0"),
                amount: jackpot,
            }),
        }
    }

    fn ledger_err(err: Error) -> LedgerError {
        match err {
            Error::Ledger(e) => e,
            other => panic!("expected ledger error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sentiment_requires_authority() {
        let (ledger, id) = closed_ledger(1_000);
        let err = ledger
            .record_sentiment(&Authority::new("mallory"), &id, 50, 0, [0; 32])
            .await
            .unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn sentiment_validates_ranges() {
        let (ledger, id) = closed_ledger(1_000);
        let err = ledger
            .record_sentiment(&authority(), &id, 101, 0, [0; 32])
            .await
            .unwrap_err();
        assert_eq!(ledger_err(err), LedgerError::InvalidScore(101));
        let err = ledger
            .record_sentiment(&authority(), &id, 50, 3, [0; 32])
            .await
            .unwrap_err();
        assert_eq!(ledger_err(err), LedgerError::InvalidConfidence(3));
    }

    #[tokio::test]
    async fn sentiment_only_once() {
        let (ledger, id) = closed_ledger(1_000);
        ledger
            .record_sentiment(&authority(), &id, 60, 1, [7; 32])
            .await
            .unwrap();
        let err = ledger
            .record_sentiment(&authority(), &id, 60, 1, [7; 32])
            .await
            .unwrap_err();
        assert!(matches!(
            ledger_err(err),
            LedgerError::InvalidState {
                expected: "closed",
                actual: "scored",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn score_recording_overwrites() {
        let (ledger, id) = closed_ledger(1_000);
        ledger
            .record_sentiment(&authority(), &id, 60, 1, [0; 32])
            .await
            .unwrap();
        let scores = vec![OpinionAiScore {
            opinion: OpinionId::new("o0"),
            score: 40,
        }];
        ledger.record_ai_scores(&authority(), &id, &scores).await.unwrap();
        ledger.record_ai_scores(&authority(), &id, &scores).await.unwrap();

        let record = ledger.record(&id).unwrap();
        assert_eq!(record.ai_scores.len(), 1);
        assert_eq!(record.ai_scores[&OpinionId::new("o0")], 40);
    }

    #[tokio::test]
    async fn finalize_takes_fee_and_rejects_overdraft() {
        let (ledger, id) = closed_ledger(1_000_000);
        ledger
            .record_sentiment(&authority(), &id, 60, 1, [0; 32])
            .await
            .unwrap();

        let err = ledger
            .finalize(&authority(), &id, &plan(&[900_001], 0))
            .await
            .unwrap_err();
        assert_eq!(
            ledger_err(err),
            LedgerError::Overdraft {
                planned: 900_001,
                distributable: 900_000
            }
        );

        let receipt = ledger
            .finalize(&authority(), &id, &plan(&[600_000, 200_000], 50_000))
            .await
            .unwrap();
        assert_eq!(receipt.protocol_fee, 100_000);
        assert_eq!(receipt.distributable, 900_000);
        assert_eq!(
            ledger.market(&id).await.unwrap().unwrap().state,
            MarketState::Settled
        );
    }

    #[tokio::test]
    async fn finalize_rejects_empty_pool() {
        let (ledger, id) = closed_ledger(0);
        ledger
            .record_sentiment(&authority(), &id, 50, 0, [0; 32])
            .await
            .unwrap();
        let err = ledger
            .finalize(&authority(), &id, &plan(&[], 0))
            .await
            .unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::EmptyPrizePool(_)));
    }

    #[tokio::test]
    async fn claims_release_escrow_once() {
        let (ledger, id) = closed_ledger(1_000_000);
        ledger
            .record_sentiment(&authority(), &id, 60, 1, [0; 32])
            .await
            .unwrap();
        ledger
            .finalize(&authority(), &id, &plan(&[600_000, 200_000], 50_000))
            .await
            .unwrap();

        let o0 = OpinionId::new("o0");
        assert_eq!(ledger.claim_payout(&id, &o0).await.unwrap(), 600_000);
        let err = ledger.claim_payout(&id, &o0).await.unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::AlreadyClaimed { .. }));

        assert_eq!(ledger.claim_jackpot(&authority(), &id).await.unwrap(), 50_000);
        let err = ledger.claim_jackpot(&authority(), &id).await.unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::AlreadyClaimed { .. }));

        assert_eq!(ledger.balance(&StakerId::new("s0")), 650_000);
        // 1_000_000 - 100_000 fee - 650_000 claimed
        assert_eq!(ledger.record(&id).unwrap().escrow, 250_000);
    }

    #[tokio::test]
    async fn claims_require_settlement() {
        let (ledger, id) = closed_ledger(1_000);
        let err = ledger
            .claim_payout(&id, &OpinionId::new("o0"))
            .await
            .unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn restarted_ledger_resumes_from_journal() {
        let journal = Arc::new(MemoryLedgerJournal::new());
        let ledger = SimulatedLedger::new(authority()).with_journal(journal.clone());
        let id = MarketId::new("m-1");
        ledger.open_market(id.clone(), 1_000_000);
        ledger.close_market(&id).unwrap();
        ledger
            .record_sentiment(&authority(), &id, 60, 1, [0; 32])
            .await
            .unwrap();
        ledger
            .finalize(&authority(), &id, &plan(&[600_000], 0))
            .await
            .unwrap();
        ledger.claim_payout(&id, &OpinionId::new("o0")).await.unwrap();

        let restarted = SimulatedLedger::new(authority()).with_journal(journal);
        let market = restarted.market(&id).await.unwrap().unwrap();

        assert_eq!(market.state, MarketState::Settled);
        let err = restarted
            .claim_payout(&id, &OpinionId::new("o0"))
            .await
            .unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::AlreadyClaimed { .. }));
        assert_eq!(restarted.balance(&StakerId::new("s0")), 0);
        assert_eq!(restarted.record(&id).unwrap().escrow, 300_000);
    }

    #[tokio::test]
    async fn failed_journal_write_leaves_record_unchanged() {
        let journal = Arc::new(MemoryLedgerJournal::new());
        let ledger = SimulatedLedger::new(authority()).with_journal(journal.clone());
        let id = MarketId::new("m-1");
        ledger.open_market(id.clone(), 1_000);
        ledger.close_market(&id).unwrap();
        journal.fail_saves(true);

        let err = ledger
            .record_sentiment(&authority(), &id, 60, 1, [0; 32])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Database(_)));
        assert_eq!(ledger.record(&id).unwrap().state, Some(MarketState::Closed));
        assert!(ledger.record(&id).unwrap().sentiment.is_none());
    }

    #[tokio::test]
    async fn unknown_market_is_reported() {
        let ledger = SimulatedLedger::new(authority());
        assert!(ledger.market(&MarketId::new("nope")).await.unwrap().is_none());
        let err = ledger
            .record_sentiment(&authority(), &MarketId::new("nope"), 50, 0, [0; 32])
            .await
            .unwrap_err();
        assert!(matches!(ledger_err(err), LedgerError::UnknownMarket(_)));
    }
}
