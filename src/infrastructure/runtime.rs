//! Service runtime lifecycle.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::outbound::sqlite::SqliteMarketStore;
use crate::application::monitor::{self, LiveMonitor, SettlementMonitor};
use crate::application::settlement::WorkerPool;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_coordinator, build_queue, build_scorer, open_database};
use crate::infrastructure::config::settings::Config;

/// The settlement service: worker pool plus both monitors.
pub struct App;

impl App {
    /// Run until Ctrl-C, then drain in-flight work and stop.
    pub async fn run(config: Config) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    warn!(error = %e, "Unable to listen for Ctrl-C");
                    // Keep the sender alive so the service keeps running.
                    std::future::pending::<()>().await;
                }
            }
        });
        Self::run_with_shutdown(config, shutdown_rx).await
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    pub async fn run_with_shutdown(config: Config, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            workers = config.settlement.workers,
            live = config.monitor.live_enabled,
            "Starting crowdsettle"
        );

        let pool = open_database(&config)?;
        let markets = Arc::new(SqliteMarketStore::new(pool.clone()));
        let queue = build_queue(&config, pool.clone());
        let scorer = build_scorer(&config)?;

        let coordinator = build_coordinator(&config, &pool, Arc::clone(&markets), Arc::clone(&scorer));
        let workers =
            WorkerPool::new(Arc::new(coordinator), queue.clone(), &config.settlement).start();

        let settlement_monitor = monitor::start(SettlementMonitor::new(
            markets.clone(),
            queue,
            &config.monitor,
        ));
        let live_monitor = config.monitor.live_enabled.then(|| {
            monitor::start(LiveMonitor::new(
                markets.clone(),
                markets,
                scorer,
                &config.monitor,
            ))
        });

        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        info!("Shutdown signal received");

        settlement_monitor.shutdown().await;
        if let Some(handle) = live_monitor {
            handle.shutdown().await;
        }
        workers.shutdown().await;
        info!("crowdsettle stopped");
        Ok(())
    }
}
