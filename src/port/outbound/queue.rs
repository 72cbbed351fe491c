//! Durable settlement job queue port.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ClaimedJob, FailedJob, JobId, SettlementJob};
use crate::error::Result;

/// Queue of settlement jobs.
///
/// A job is delivered to at most one worker at a time, and no two jobs for
/// the same market are in flight together.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Add a job. Duplicates for the same market are allowed.
    async fn enqueue(&self, job: SettlementJob) -> Result<JobId>;

    /// Take the next available job, if any, and bump its attempt counter.
    async fn claim(&self) -> Result<Option<ClaimedJob>>;

    /// Mark a claimed job done.
    async fn complete(&self, id: &JobId) -> Result<()>;

    /// Put a claimed job back, available again after `delay`.
    async fn retry(&self, id: &JobId, delay: Duration, error: &str) -> Result<()>;

    /// Park a job for operator attention.
    async fn fail(&self, id: &JobId, error: &str) -> Result<()>;

    /// Jobs parked by [`fail`](Self::fail).
    async fn failed(&self) -> Result<Vec<FailedJob>>;

    /// Reset a failed job to queued with a fresh attempt count.
    ///
    /// Returns `false` if no failed job has this ID.
    async fn requeue(&self, id: &JobId) -> Result<bool>;
}
