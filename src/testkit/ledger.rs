//! Ledger wrapper that injects transient failures.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::outbound::ledger::SimulatedLedger;
use crate::domain::{Authority, CrowdScore, MarketId, OpinionId};
use crate::error::{LedgerError, Result};
use crate::port::outbound::ledger::{
    FinalizeReceipt, LayerScores, Ledger, LedgerMarket, OpinionAiScore, PayoutPlan,
};

/// Ledger call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Sentiment,
    AiScores,
    LayerScores,
    Finalize,
    ClaimPayout,
    ClaimJackpot,
}

/// [`SimulatedLedger`] that fails chosen steps a set number of times with
/// [`LedgerError::Unavailable`] before delegating.
pub struct FlakyLedger {
    inner: SimulatedLedger,
    failures: Mutex<HashMap<Step, usize>>,
    calls: Mutex<HashMap<Step, usize>>,
}

impl FlakyLedger {
    pub fn new(inner: SimulatedLedger) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Fail the next `times` calls of `step`.
    pub fn fail(&self, step: Step, times: usize) {
        self.failures.lock().insert(step, times);
    }

    /// Calls of `step` that reached the ledger, failed ones included.
    pub fn calls(&self, step: Step) -> usize {
        self.calls.lock().get(&step).copied().unwrap_or(0)
    }

    pub fn inner(&self) -> &SimulatedLedger {
        &self.inner
    }

    fn enter(&self, step: Step) -> Result<()> {
        *self.calls.lock().entry(step).or_insert(0) += 1;
        let mut failures = self.failures.lock();
        match failures.get_mut(&step) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(LedgerError::Unavailable(format!("{step:?} dropped")).into())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Ledger for FlakyLedger {
    async fn market(&self, market: &MarketId) -> Result<Option<LedgerMarket>> {
        self.inner.market(market).await
    }

    async fn record_sentiment(
        &self,
        authority: &Authority,
        market: &MarketId,
        score: u8,
        confidence: u8,
        summary_hash: [u8; 32],
    ) -> Result<()> {
        self.enter(Step::Sentiment)?;
        self.inner
            .record_sentiment(authority, market, score, confidence, summary_hash)
            .await
    }

    async fn record_ai_scores(
        &self,
        authority: &Authority,
        market: &MarketId,
        scores: &[OpinionAiScore],
    ) -> Result<()> {
        self.enter(Step::AiScores)?;
        self.inner.record_ai_scores(authority, market, scores).await
    }

    async fn record_layer_scores(
        &self,
        authority: &Authority,
        market: &MarketId,
        crowd_score: CrowdScore,
        scores: &[LayerScores],
    ) -> Result<()> {
        self.enter(Step::LayerScores)?;
        self.inner
            .record_layer_scores(authority, market, crowd_score, scores)
            .await
    }

    async fn finalize(
        &self,
        authority: &Authority,
        market: &MarketId,
        plan: &PayoutPlan,
    ) -> Result<FinalizeReceipt> {
        self.enter(Step::Finalize)?;
        self.inner.finalize(authority, market, plan).await
    }

    async fn claim_payout(&self, market: &MarketId, opinion: &OpinionId) -> Result<u64> {
        self.enter(Step::ClaimPayout)?;
        self.inner.claim_payout(market, opinion).await
    }

    async fn claim_jackpot(&self, authority: &Authority, market: &MarketId) -> Result<u64> {
        self.enter(Step::ClaimJackpot)?;
        self.inner.claim_jackpot(authority, market).await
    }
}
