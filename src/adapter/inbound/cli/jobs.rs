//! Handlers for `jobs` subcommands.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{JobEnqueueArgs, JobRetryArgs};
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::{DbPool, SqliteMarketStore};
use crate::domain::error::DomainError;
use crate::domain::{FailedJob, JobId, MarketId, MarketState, SettlementJob};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::{build_queue, open_database};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::query::MarketQuery;
use crate::port::outbound::queue::JobQueue;

#[derive(Debug, Serialize, Tabled)]
struct FailedJobRow {
    #[tabled(rename = "Job")]
    id: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Failed at")]
    failed_at: String,
    #[tabled(rename = "Last error")]
    last_error: String,
}

impl From<FailedJob> for FailedJobRow {
    fn from(job: FailedJob) -> Self {
        Self {
            id: job.id.to_string(),
            market: job.market_id.to_string(),
            attempts: job.attempts,
            failed_at: job.failed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            last_error: job.last_error.unwrap_or_default(),
        }
    }
}

fn open(config_path: &Path) -> Result<(Config, DbPool)> {
    let config = Config::load(config_path)?;
    let pool = open_database(&config)?;
    Ok((config, pool))
}

/// List jobs parked for operator attention.
pub async fn execute_failed(config_path: &Path) -> Result<()> {
    let (config, pool) = open(config_path)?;
    let queue = build_queue(&config, pool);
    let failed = queue.failed().await?;

    output::section("Queue");
    for (status, count) in queue.counts()? {
        output::field(&status, count);
    }

    output::section("Failed jobs");
    if failed.is_empty() {
        output::success("No failed jobs");
        return Ok(());
    }

    let count = failed.len();
    let rows: Vec<FailedJobRow> = failed.into_iter().map(FailedJobRow::from).collect();
    output::table(&rows);
    output::hint(&format!(
        "{count} job(s) parked; requeue with `crowdsettle jobs retry <id>`"
    ));
    Ok(())
}

/// Put a failed job back on the queue.
pub async fn execute_retry(args: &JobRetryArgs) -> Result<()> {
    let (config, pool) = open(&args.config)?;
    let queue = build_queue(&config, pool);
    let id = JobId::from(args.id.clone());

    if !queue.requeue(&id).await? {
        return Err(Error::NotFound {
            what: "failed job",
            id: args.id.clone(),
        });
    }
    output::success(&format!("Requeued job {}", output::highlight(&id)));
    Ok(())
}

/// Queue a closed market for settlement.
pub async fn execute_enqueue(args: &JobEnqueueArgs) -> Result<()> {
    let (config, pool) = open(&args.config)?;
    let markets = Arc::new(SqliteMarketStore::new(pool.clone()));
    let queue = build_queue(&config, pool);

    let job_id = enqueue_market(markets.as_ref(), queue.as_ref(), &MarketId::new(&args.market)).await?;
    output::success(&format!(
        "Queued market {} as job {}",
        output::highlight(&args.market),
        output::muted(&job_id)
    ));
    Ok(())
}

/// Fetch a market, check it is closed, and queue a job for it.
pub async fn enqueue_market(
    query: &dyn MarketQuery,
    queue: &dyn JobQueue,
    id: &MarketId,
) -> Result<JobId> {
    let market = query.market(id).await?.ok_or_else(|| Error::NotFound {
        what: "market",
        id: id.to_string(),
    })?;
    if market.state != MarketState::Closed {
        return Err(DomainError::NotClosed {
            market: id.to_string(),
            state: market.state.to_string(),
        }
        .into());
    }
    let job = SettlementJob::from_market(market)?;
    queue.enqueue(job).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::three_opinion_market;
    use crate::testkit::memory::{MemoryMarkets, MemoryQueue};

    #[tokio::test]
    async fn enqueues_closed_market() {
        let markets = MemoryMarkets::new();
        markets.insert(three_opinion_market("m-1", MarketState::Closed));
        let queue = MemoryQueue::default();

        enqueue_market(&markets, &queue, &MarketId::new("m-1"))
            .await
            .unwrap();

        assert_eq!(queue.markets(), vec![MarketId::new("m-1")]);
    }

    #[tokio::test]
    async fn active_market_is_refused() {
        let markets = MemoryMarkets::new();
        markets.insert(three_opinion_market("m-1", MarketState::Active));
        let queue = MemoryQueue::default();

        let result = enqueue_market(&markets, &queue, &MarketId::new("m-1")).await;

        assert!(matches!(
            result,
            Err(Error::Domain(DomainError::NotClosed { .. }))
        ));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn unknown_market_is_not_found() {
        let markets = MemoryMarkets::new();
        let queue = MemoryQueue::default();

        let result = enqueue_market(&markets, &queue, &MarketId::new("nope")).await;

        assert!(matches!(result, Err(Error::NotFound { what: "market", .. })));
    }
}
