//! In-memory implementations of the storage, queue, checkpoint, and ledger
//! journal seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::adapter::outbound::ledger::{LedgerJournal, LedgerRecord};
use crate::domain::{
    ClaimedJob, FailedJob, JobId, JobStatus, LiveSentiment, Market, MarketId, MarketState,
    MarketSummary, SettlementCheckpoint, SettlementJob,
};
use crate::error::{Error, Result};
use crate::port::outbound::checkpoint::CheckpointStore;
use crate::port::outbound::query::{MarketQuery, Page, PageRequest};
use crate::port::outbound::queue::JobQueue;
use crate::port::outbound::store::SettlementStore;

/// Market query and settlement store backed by a map.
#[derive(Default)]
pub struct MemoryMarkets {
    markets: Mutex<Vec<Market>>,
    settled: Mutex<HashMap<MarketId, SettlementCheckpoint>>,
    settle_calls: AtomicUsize,
    live: Mutex<Vec<LiveSentiment>>,
    fetches: AtomicUsize,
    fail_writes: AtomicBool,
    fail_fetch: Mutex<Vec<MarketId>>,
}

impl MemoryMarkets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markets(markets: Vec<Market>) -> Self {
        let store = Self::new();
        for m in markets {
            store.insert(m);
        }
        store
    }

    /// Insert or replace a market.
    pub fn insert(&self, market: Market) {
        let mut markets = self.markets.lock();
        markets.retain(|m| m.id != market.id);
        markets.push(market);
    }

    /// Make every write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make fetching this market fail with a connection error.
    pub fn fail_fetch(&self, id: &str) {
        self.fail_fetch.lock().push(MarketId::new(id));
    }

    pub fn state(&self, id: &MarketId) -> Option<MarketState> {
        self.markets.lock().iter().find(|m| &m.id == id).map(|m| m.state)
    }

    pub fn settled(&self, id: &MarketId) -> Option<SettlementCheckpoint> {
        self.settled.lock().get(id).cloned()
    }

    pub fn settle_calls(&self) -> usize {
        self.settle_calls.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> Vec<LiveSentiment> {
        self.live.lock().clone()
    }

    /// Number of single-market fetches served.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database("storage offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketQuery for MemoryMarkets {
    async fn list_markets(
        &self,
        state: MarketState,
        page: PageRequest,
    ) -> Result<Page<MarketSummary>> {
        let mut matching: Vec<MarketSummary> = self
            .markets
            .lock()
            .iter()
            .filter(|m| m.state == state)
            .map(Market::summary)
            .collect();
        matching.sort_by(|a, b| a.closes_at.cmp(&b.closes_at).then(a.id.cmp(&b.id)));

        let total = matching.len();
        let items: Vec<_> = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        let next = (page.offset + page.limit < total).then(|| PageRequest {
            offset: page.offset + page.limit,
            limit: page.limit,
        });
        Ok(Page { items, next })
    }

    async fn market(&self, id: &MarketId) -> Result<Option<Market>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.lock().contains(id) {
            return Err(Error::Connection(format!("fetch {id} refused")));
        }
        Ok(self.markets.lock().iter().find(|m| &m.id == id).cloned())
    }
}

#[async_trait]
impl SettlementStore for MemoryMarkets {
    async fn mark_settled(&self, id: &MarketId, checkpoint: &SettlementCheckpoint) -> Result<()> {
        self.settle_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        let mut markets = self.markets.lock();
        let market = markets
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| Error::NotFound {
                what: "market",
                id: id.to_string(),
            })?;
        market.state = MarketState::Settled;
        self.settled.lock().insert(id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn record_live_sentiment(&self, sentiment: &LiveSentiment) -> Result<()> {
        self.check_writes()?;
        self.live.lock().push(sentiment.clone());
        Ok(())
    }
}

struct Entry {
    id: JobId,
    job: SettlementJob,
    status: JobStatus,
    attempts: u32,
    last_error: Option<String>,
    available_at: Instant,
}

/// Job queue with the same delivery rules as the SQLite queue.
pub struct MemoryQueue {
    lease: Duration,
    entries: Mutex<Vec<Entry>>,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl MemoryQueue {
    pub fn new(lease: Duration) -> Self {
        Self {
            lease,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.entries.lock().iter().find(|e| &e.id == id).map(|e| e.status)
    }

    pub fn attempts(&self, id: &JobId) -> Option<u32> {
        self.entries
            .lock()
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.attempts)
    }

    pub fn last_error(&self, id: &JobId) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|e| &e.id == id)
            .and_then(|e| e.last_error.clone())
    }

    /// Markets with a job, in enqueue order.
    pub fn markets(&self) -> Vec<MarketId> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.job.market_id().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every job has reached `completed` or `failed`.
    pub fn is_drained(&self) -> bool {
        self.entries
            .lock()
            .iter()
            .all(|e| matches!(e.status, JobStatus::Completed | JobStatus::Failed))
    }

    fn update(&self, id: &JobId, f: impl FnOnce(&mut Entry)) -> Result<()> {
        let mut entries = self.entries.lock();
        let entry = entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| Error::NotFound {
                what: "job",
                id: id.to_string(),
            })?;
        f(entry);
        Ok(())
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: SettlementJob) -> Result<JobId> {
        let id = JobId::generate();
        self.entries.lock().push(Entry {
            id: id.clone(),
            job,
            status: JobStatus::Queued,
            attempts: 0,
            last_error: None,
            available_at: Instant::now(),
        });
        Ok(id)
    }

    async fn claim(&self) -> Result<Option<ClaimedJob>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let busy: Vec<MarketId> = entries
            .iter()
            .filter(|e| e.status == JobStatus::Running && e.available_at > now)
            .map(|e| e.job.market_id().clone())
            .collect();

        let Some(entry) = entries.iter_mut().find(|e| {
            matches!(e.status, JobStatus::Queued | JobStatus::Running)
                && e.available_at <= now
                && !busy.contains(e.job.market_id())
        }) else {
            return Ok(None);
        };

        entry.status = JobStatus::Running;
        entry.attempts += 1;
        entry.available_at = now + self.lease;
        Ok(Some(ClaimedJob {
            id: entry.id.clone(),
            job: entry.job.clone(),
            attempt: entry.attempts,
        }))
    }

    async fn complete(&self, id: &JobId) -> Result<()> {
        self.update(id, |e| {
            e.status = JobStatus::Completed;
            e.last_error = None;
        })
    }

    async fn retry(&self, id: &JobId, delay: Duration, error: &str) -> Result<()> {
        self.update(id, |e| {
            e.status = JobStatus::Queued;
            e.available_at = Instant::now() + delay;
            e.last_error = Some(error.to_string());
        })
    }

    async fn fail(&self, id: &JobId, error: &str) -> Result<()> {
        self.update(id, |e| {
            e.status = JobStatus::Failed;
            e.last_error = Some(error.to_string());
        })
    }

    async fn failed(&self) -> Result<Vec<FailedJob>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|e| e.status == JobStatus::Failed)
            .map(|e| FailedJob {
                id: e.id.clone(),
                market_id: e.job.market_id().clone(),
                attempts: e.attempts,
                last_error: e.last_error.clone(),
                failed_at: Utc::now(),
            })
            .collect())
    }

    async fn requeue(&self, id: &JobId) -> Result<bool> {
        let mut entries = self.entries.lock();
        let Some(entry) = entries
            .iter_mut()
            .find(|e| &e.id == id && e.status == JobStatus::Failed)
        else {
            return Ok(false);
        };
        entry.status = JobStatus::Queued;
        entry.attempts = 0;
        entry.available_at = Instant::now();
        Ok(true)
    }
}

/// Checkpoint store backed by a map.
#[derive(Default)]
pub struct MemoryCheckpoints {
    checkpoints: Mutex<HashMap<MarketId, SettlementCheckpoint>>,
    saves: AtomicUsize,
}

impl MemoryCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoints {
    async fn load(&self, market: &MarketId) -> Result<Option<SettlementCheckpoint>> {
        Ok(self.checkpoints.lock().get(market).cloned())
    }

    async fn save(&self, checkpoint: SettlementCheckpoint) -> Result<SettlementCheckpoint> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .checkpoints
            .lock()
            .entry(checkpoint.market_id.clone())
            .or_insert(checkpoint)
            .clone())
    }
}

/// Ledger journal backed by a map, shared across ledger instances to stand
/// in for a restart.
#[derive(Default)]
pub struct MemoryLedgerJournal {
    records: Mutex<HashMap<MarketId, LedgerRecord>>,
    fail_saves: AtomicBool,
}

impl MemoryLedgerJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl LedgerJournal for MemoryLedgerJournal {
    fn load(&self, market: &MarketId) -> Result<Option<LedgerRecord>> {
        Ok(self.records.lock().get(market).cloned())
    }

    fn save(&self, market: &MarketId, record: &LedgerRecord) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Database("journal offline".into()));
        }
        self.records.lock().insert(market.clone(), record.clone());
        Ok(())
    }
}
