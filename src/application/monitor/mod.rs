//! Periodic pollers over the market query interface.
//!
//! - [`settlement`] - Enqueues a settlement job for each closed market.
//! - [`live`] - Blends crowd and AI sentiment for active markets.
//!
//! Both run one cycle per tick on a single task. A cycle that overruns its
//! period delays the next tick rather than overlapping it.

pub mod live;
pub mod settlement;

pub use live::LiveMonitor;
pub use settlement::SettlementMonitor;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Counts from one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Markets acted on: jobs enqueued or sentiments recorded.
    pub processed: usize,
    /// Markets listed but deliberately passed over.
    pub skipped: usize,
    /// Markets whose handling failed this cycle.
    pub failed: usize,
}

/// A poller run on a fixed period.
#[async_trait]
pub trait Monitor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn period(&self) -> Duration;

    /// Run one poll cycle.
    async fn run_cycle(&self) -> crate::error::Result<CycleSummary>;
}

/// Handle for stopping a running monitor.
pub struct MonitorHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the monitor to stop and wait for its current cycle to end.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "monitor task panicked");
        }
    }
}

/// Spawn `monitor` on its own task. The first cycle runs immediately.
pub fn start<M: Monitor>(monitor: M) -> MonitorHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let monitor = Arc::new(monitor);

    let task = tokio::spawn(async move {
        let name = monitor.name();
        let mut interval = tokio::time::interval(monitor.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(monitor = name, period_secs = monitor.period().as_secs(), "monitor started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(monitor = name, "monitor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match monitor.run_cycle().await {
                        Ok(summary) if summary.processed > 0 || summary.failed > 0 => info!(
                            monitor = name,
                            processed = summary.processed,
                            skipped = summary.skipped,
                            failed = summary.failed,
                            "poll cycle finished"
                        ),
                        Ok(_) => {}
                        Err(e) => warn!(monitor = name, error = %e, "poll cycle failed"),
                    }
                }
            }
        }
    });

    MonitorHandle { shutdown_tx, task }
}
