//! Settlement coordination: workers, retries, and reporting.
//!
//! - [`coordinator`] - Settles one market, resuming from its checkpoint.
//! - [`worker`] - Bounded worker pool draining the job queue.
//! - [`retry`] - Backoff policy between attempts.
//! - [`report`] - Audit report built from a checkpoint.

pub mod coordinator;
pub mod report;
pub mod retry;
pub mod worker;

pub use coordinator::{SettlementCoordinator, SettlementOutcome};
pub use report::SettlementReport;
pub use retry::RetryPolicy;
pub use worker::{JobOutcome, WorkerPool, WorkerPoolHandle};
