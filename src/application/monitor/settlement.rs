//! Discovers closed markets and queues them for settlement.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::{CycleSummary, Monitor};
use crate::domain::{MarketId, MarketState, SettlementJob};
use crate::error::Result;
use crate::infrastructure::config::monitor::MonitorConfig;
use crate::port::outbound::query::{MarketQuery, PageRequest};
use crate::port::outbound::queue::JobQueue;

pub struct SettlementMonitor {
    query: Arc<dyn MarketQuery>,
    queue: Arc<dyn JobQueue>,
    period: Duration,
    page_size: usize,
}

impl SettlementMonitor {
    pub fn new(query: Arc<dyn MarketQuery>, queue: Arc<dyn JobQueue>, config: &MonitorConfig) -> Self {
        Self {
            query,
            queue,
            period: config.settlement_interval(),
            page_size: config.page_size.max(1),
        }
    }

    /// Fetch a market and queue it. Returns `false` if it no longer needs
    /// settling.
    async fn enqueue(&self, id: &MarketId) -> Result<bool> {
        let Some(market) = self.query.market(id).await? else {
            debug!(market = %id, "market vanished before fetch");
            return Ok(false);
        };
        if market.state != MarketState::Closed {
            debug!(market = %id, state = %market.state, "market moved on, not queued");
            return Ok(false);
        }

        let opinions = market.opinions.len();
        let job = SettlementJob::from_market(market)?;
        let job_id = self.queue.enqueue(job).await?;
        info!(market = %id, job = %job_id, opinions, "settlement job queued");
        Ok(true)
    }
}

#[async_trait]
impl Monitor for SettlementMonitor {
    fn name(&self) -> &'static str {
        "settlement"
    }

    fn period(&self) -> Duration {
        self.period
    }

    /// Queue one job per closed market past its close time.
    ///
    /// Markets that fail to fetch or validate are logged and left for the
    /// next cycle; only a failed listing aborts the cycle.
    async fn run_cycle(&self) -> Result<CycleSummary> {
        let now = Utc::now();
        let mut summary = CycleSummary::default();
        let mut seen = HashSet::new();
        let mut request = Some(PageRequest::first(self.page_size));

        while let Some(page_request) = request {
            let page = self
                .query
                .list_markets(MarketState::Closed, page_request)
                .await?;

            for market in page.items {
                if !market.is_past_close(now) || !seen.insert(market.id.clone()) {
                    summary.skipped += 1;
                    continue;
                }
                match self.enqueue(&market.id).await {
                    Ok(true) => summary.processed += 1,
                    Ok(false) => summary.skipped += 1,
                    Err(e) => {
                        warn!(market = %market.id, error = %e, "failed to queue market");
                        summary.failed += 1;
                    }
                }
            }
            request = page.next;
        }

        Ok(summary)
    }
}
