//! Live blended sentiment for active markets.
//!
//! Each pass blends two signals per market with equal weight: the crowd
//! score, computed locally, and a fresh market rating from the rating
//! service. Markets rated within the debounce window are skipped to bound
//! rating calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};

use super::{CycleSummary, Monitor};
use crate::application::scoring::Scorer;
use crate::domain::scoring::calculate_crowd_score;
use crate::domain::{LiveSentiment, MarketId, MarketState};
use crate::error::Result;
use crate::infrastructure::config::monitor::MonitorConfig;
use crate::port::outbound::query::{MarketQuery, PageRequest};
use crate::port::outbound::store::SettlementStore;

pub struct LiveMonitor {
    query: Arc<dyn MarketQuery>,
    store: Arc<dyn SettlementStore>,
    scorer: Arc<Scorer>,
    period: Duration,
    debounce: Duration,
    min_opinions: usize,
    page_size: usize,
    last_rated: DashMap<MarketId, Instant>,
}

impl LiveMonitor {
    pub fn new(
        query: Arc<dyn MarketQuery>,
        store: Arc<dyn SettlementStore>,
        scorer: Arc<Scorer>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            query,
            store,
            scorer,
            period: config.live_interval(),
            debounce: config.live_debounce(),
            min_opinions: config.live_min_opinions.max(1),
            page_size: config.page_size.max(1),
            last_rated: DashMap::new(),
        }
    }

    fn recently_rated(&self, id: &MarketId) -> bool {
        self.last_rated
            .get(id)
            .is_some_and(|at| at.elapsed() < self.debounce)
    }

    /// Blend and record sentiment for one market.
    ///
    /// Returns `None` if the market is gone, no longer active, or too thin.
    pub async fn measure(&self, id: &MarketId) -> Result<Option<LiveSentiment>> {
        let Some(market) = self.query.market(id).await? else {
            return Ok(None);
        };
        if market.state != MarketState::Active || market.opinions.len() < self.min_opinions {
            return Ok(None);
        }

        let crowd = calculate_crowd_score(&market.opinions);
        let rating = self
            .scorer
            .rate_market(&market.statement, &market.opinions)
            .await;
        let sentiment = LiveSentiment::blend(
            market.id,
            crowd,
            rating.score,
            market.opinions.len(),
            Utc::now(),
        );

        self.store.record_live_sentiment(&sentiment).await?;
        self.last_rated.insert(id.clone(), Instant::now());
        debug!(
            market = %id,
            crowd = %sentiment.crowd_score,
            ai = sentiment.ai_score,
            blended = sentiment.blended_score,
            confidence = %sentiment.confidence,
            "live sentiment recorded"
        );
        Ok(Some(sentiment))
    }
}

#[async_trait]
impl Monitor for LiveMonitor {
    fn name(&self) -> &'static str {
        "live"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run_cycle(&self) -> Result<CycleSummary> {
        let mut summary = CycleSummary::default();
        let mut request = Some(PageRequest::first(self.page_size));

        while let Some(page_request) = request {
            let page = self
                .query
                .list_markets(MarketState::Active, page_request)
                .await?;

            for market in page.items {
                if market.opinion_count < self.min_opinions || self.recently_rated(&market.id) {
                    summary.skipped += 1;
                    continue;
                }
                match self.measure(&market.id).await {
                    Ok(Some(_)) => summary.processed += 1,
                    Ok(None) => summary.skipped += 1,
                    Err(e) => {
                        warn!(market = %market.id, error = %e, "live sentiment failed");
                        summary.failed += 1;
                    }
                }
            }
            request = page.next;
        }

        // Forget markets that left the debounce window.
        self.last_rated.retain(|_, at| at.elapsed() < self.debounce);
        Ok(summary)
    }
}
