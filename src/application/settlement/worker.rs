//! Bounded pool of settlement workers draining the job queue.
//!
//! Every worker loops claim, settle, report. The queue hands a job to one
//! worker at a time and never two jobs for the same market, so workers share
//! nothing but the coordinator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::coordinator::{SettlementCoordinator, SettlementOutcome};
use super::retry::RetryPolicy;
use crate::domain::ClaimedJob;
use crate::error::{Error, Result};
use crate::infrastructure::config::settlement::SettlementConfig;
use crate::port::outbound::queue::JobQueue;

/// What happened to one claimed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// Re-queued, available again after the delay.
    Retrying(Duration),
    /// Parked for the operator.
    Failed,
}

/// Handle for stopping a running pool.
pub struct WorkerPoolHandle {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPoolHandle {
    /// Stop claiming new jobs and wait for in-flight ones to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "settlement worker panicked");
            }
        }
    }
}

pub struct WorkerPool {
    coordinator: Arc<SettlementCoordinator>,
    queue: Arc<dyn JobQueue>,
    policy: RetryPolicy,
    workers: usize,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl WorkerPool {
    pub fn new(
        coordinator: Arc<SettlementCoordinator>,
        queue: Arc<dyn JobQueue>,
        config: &SettlementConfig,
    ) -> Self {
        Self {
            coordinator,
            queue,
            policy: RetryPolicy::from(config),
            workers: config.workers.max(1),
            poll_interval: config.poll_interval(),
            job_timeout: config.job_timeout(),
        }
    }

    /// Override the per-attempt time limit.
    #[must_use]
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Claim and process at most one job.
    ///
    /// Returns `None` when nothing was available.
    ///
    /// # Errors
    ///
    /// Only queue failures are returned; settlement failures are recorded on
    /// the job.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>> {
        let Some(ClaimedJob { id, job, attempt }) = self.queue.claim().await? else {
            return Ok(None);
        };
        let market = job.market_id();
        debug!(job = %id, market = %market, attempt, "job claimed");

        let result = match tokio::time::timeout(self.job_timeout, self.coordinator.settle(&job)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                what: "settlement",
                secs: self.job_timeout.as_secs(),
            }),
        };

        match result {
            Ok(outcome) => {
                self.queue.complete(&id).await?;
                if outcome == SettlementOutcome::AlreadySettled {
                    info!(job = %id, market = %market, "market already settled, job completed");
                }
                Ok(Some(JobOutcome::Completed))
            }
            Err(e) => {
                let reason = e.to_string();
                match self.policy.next_delay(attempt, &e) {
                    Some(delay) => {
                        warn!(
                            job = %id,
                            market = %market,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "settlement attempt failed, retrying"
                        );
                        self.queue.retry(&id, delay, &reason).await?;
                        Ok(Some(JobOutcome::Retrying(delay)))
                    }
                    None => {
                        error!(
                            job = %id,
                            market = %market,
                            attempt,
                            error = %e,
                            "settlement failed, job needs operator attention"
                        );
                        self.queue.fail(&id, &reason).await?;
                        Ok(Some(JobOutcome::Failed))
                    }
                }
            }
        }
    }

    /// Spawn the workers.
    pub fn start(self) -> WorkerPoolHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let count = self.workers;
        let pool = Arc::new(self);

        let workers = (0..count)
            .map(|worker| {
                let pool = Arc::clone(&pool);
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    debug!(worker, "settlement worker started");
                    while !*shutdown_rx.borrow() {
                        let idle = match pool.run_once().await {
                            Ok(Some(_)) => false,
                            Ok(None) => true,
                            Err(e) => {
                                warn!(worker, error = %e, "job queue unavailable");
                                true
                            }
                        };
                        if idle {
                            tokio::select! {
                                _ = shutdown_rx.changed() => {}
                                _ = tokio::time::sleep(pool.poll_interval) => {}
                            }
                        }
                    }
                    debug!(worker, "settlement worker stopped");
                })
            })
            .collect();

        info!(workers = count, "settlement worker pool started");
        WorkerPoolHandle {
            shutdown_tx,
            workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::ledger::SimulatedLedger;
    use crate::adapter::outbound::rating::LlmRater;
    use crate::application::scoring::Scorer;
    use crate::domain::{Authority, JobId, JobStatus, MarketId, MarketState, SettlementJob};
    use crate::port::outbound::checkpoint::CheckpointStore;
    use crate::port::outbound::rating::OpinionRater;
    use crate::testkit::config;
    use crate::testkit::domain::three_opinion_market;
    use crate::testkit::ledger::{FlakyLedger, Step};
    use crate::testkit::llm::{FixedRater, StalledLlm};
    use crate::testkit::memory::{MemoryCheckpoints, MemoryMarkets, MemoryQueue};

    struct Harness {
        markets: Arc<MemoryMarkets>,
        ledger: Arc<FlakyLedger>,
        checkpoints: Arc<MemoryCheckpoints>,
        queue: Arc<MemoryQueue>,
        pool: WorkerPool,
    }

    fn harness_with(rater: Arc<dyn OpinionRater>, ledger_authority: &str, workers: usize) -> Harness {
        let markets = Arc::new(MemoryMarkets::new());
        let ledger = Arc::new(FlakyLedger::new(
            SimulatedLedger::new(Authority::new(ledger_authority)).with_query(markets.clone()),
        ));
        let checkpoints = Arc::new(MemoryCheckpoints::new());
        let queue = Arc::new(MemoryQueue::default());
        let coordinator = SettlementCoordinator::new(
            Arc::new(Scorer::new(rater)),
            markets.clone(),
            markets.clone(),
            ledger.clone(),
            checkpoints.clone(),
            Authority::new("settler"),
        )
        .with_seed(3);
        let pool = WorkerPool::new(
            Arc::new(coordinator),
            queue.clone(),
            &config::settlement(workers),
        );
        Harness {
            markets,
            ledger,
            checkpoints,
            queue,
            pool,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(FixedRater::new(60)), "settler", 1)
    }

    async fn enqueue_market(h: &Harness, id: &str) -> JobId {
        enqueue_market_into(&h.markets, &h.queue, id).await
    }

    async fn enqueue_market_into(markets: &MemoryMarkets, queue: &MemoryQueue, id: &str) -> JobId {
        let m = three_opinion_market(id, MarketState::Closed);
        markets.insert(m.clone());
        queue
            .enqueue(SettlementJob::from_market(m).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_queue_is_idle() {
        let h = harness();
        assert_eq!(h.pool.run_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_then_completes() {
        let h = harness();
        let id = enqueue_market(&h, "m-1").await;
        h.ledger.fail(Step::Finalize, 1);

        let first = h.pool.run_once().await.unwrap();
        assert_eq!(first, Some(JobOutcome::Retrying(Duration::from_millis(5))));
        assert_eq!(h.queue.status(&id), Some(JobStatus::Queued));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(h.pool.run_once().await.unwrap(), Some(JobOutcome::Completed));
        assert_eq!(h.queue.status(&id), Some(JobStatus::Completed));
        assert_eq!(h.queue.attempts(&id), Some(2));
    }

    #[tokio::test]
    async fn exhausted_retries_park_the_job() {
        let h = harness();
        let id = enqueue_market(&h, "m-1").await;
        h.ledger.fail(Step::Sentiment, 10);

        let mut outcomes = Vec::new();
        for _ in 0..3 {
            outcomes.push(h.pool.run_once().await.unwrap());
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        assert_eq!(
            outcomes,
            vec![
                Some(JobOutcome::Retrying(Duration::from_millis(5))),
                Some(JobOutcome::Retrying(Duration::from_millis(10))),
                Some(JobOutcome::Failed),
            ]
        );
        assert_eq!(h.queue.status(&id), Some(JobStatus::Failed));
        assert!(h.queue.last_error(&id).unwrap().contains("unavailable"));
        assert_eq!(h.pool.run_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unauthorized_ledger_fails_without_retry() {
        let h = harness_with(Arc::new(FixedRater::new(60)), "someone-else", 1);
        let id = enqueue_market(&h, "m-1").await;

        assert_eq!(h.pool.run_once().await.unwrap(), Some(JobOutcome::Failed));
        assert_eq!(h.queue.attempts(&id), Some(1));
        assert!(h.queue.last_error(&id).unwrap().contains("unauthorized"));
    }

    #[tokio::test]
    async fn stalled_attempt_times_out_and_retries() {
        let rater = Arc::new(LlmRater::new(Arc::new(StalledLlm), Duration::from_secs(60)));
        let h = harness_with(rater, "settler", 1);
        let pool = h.pool.with_job_timeout(Duration::from_millis(50));
        let id = enqueue_market_into(&h.markets, &h.queue, "m-1").await;

        let outcome = pool.run_once().await.unwrap();

        assert!(matches!(outcome, Some(JobOutcome::Retrying(_))));
        assert!(h.queue.last_error(&id).unwrap().contains("timed out"));
        assert_eq!(h.checkpoints.saves(), 0);
    }

    #[tokio::test]
    async fn started_pool_drains_the_queue() {
        let h = harness_with(Arc::new(FixedRater::new(60)), "settler", 3);
        for id in ["m-1", "m-2", "m-3", "m-4"] {
            enqueue_market(&h, id).await;
        }
        // A duplicate job for a market already queued.
        let dup = three_opinion_market("m-1", MarketState::Closed);
        h.queue
            .enqueue(SettlementJob::from_market(dup).unwrap())
            .await
            .unwrap();

        let queue = h.queue.clone();
        let handle = h.pool.start();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !queue.is_drained() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        handle.shutdown().await;

        for id in ["m-1", "m-2", "m-3", "m-4"] {
            let market = MarketId::new(id);
            assert_eq!(h.markets.state(&market), Some(MarketState::Settled));
            assert!(h.checkpoints.load(&market).await.unwrap().is_some());
        }
        assert_eq!(h.checkpoints.saves(), 4);
    }
}
