//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::ledger::SimulatedLedger;
use crate::adapter::outbound::llm;
use crate::adapter::outbound::rating::LlmRater;
use crate::adapter::outbound::sqlite::{
    self, DbPool, SqliteCheckpointStore, SqliteJobQueue, SqliteLedgerJournal, SqliteMarketStore,
};
use crate::application::scoring::Scorer;
use crate::application::settlement::SettlementCoordinator;
use crate::domain::Authority;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Open the SQLite database and apply migrations.
pub fn open_database(config: &Config) -> Result<DbPool> {
    let pool = sqlite::open(&config.database)?;
    info!(database = %config.database, "Database initialized");
    Ok(pool)
}

/// Durable job queue with a lease sized to the job timeout.
pub fn build_queue(config: &Config, pool: DbPool) -> Arc<SqliteJobQueue> {
    Arc::new(SqliteJobQueue::new(pool, config.settlement.lease()))
}

/// Build the scorer over the configured LLM provider.
///
/// # Errors
///
/// Fails if the provider's API key is not set.
pub fn build_scorer(config: &Config) -> Result<Arc<Scorer>> {
    let client = llm::build(&config.llm)?;
    info!(
        provider = client.name(),
        model = config.llm.model(),
        "LLM client initialized"
    );
    let rater = Arc::new(LlmRater::new(client, config.rating.timeout()));
    Ok(Arc::new(
        Scorer::new(rater).with_limits(config.rating.max_text_chars, config.rating.batch_size),
    ))
}

/// In-process ledger journaled to SQLite. Markets it has never seen are
/// opened from the market mirror.
pub fn build_ledger(
    config: &Config,
    pool: &DbPool,
    markets: Arc<SqliteMarketStore>,
) -> Arc<SimulatedLedger> {
    info!(authority = %config.ledger.authority, "Simulated ledger initialized");
    Arc::new(
        SimulatedLedger::new(Authority::new(&config.ledger.authority))
            .with_journal(Arc::new(SqliteLedgerJournal::new(pool.clone())))
            .with_query(markets),
    )
}

/// Wire the coordinator over the SQLite adapters.
pub fn build_coordinator(
    config: &Config,
    pool: &DbPool,
    markets: Arc<SqliteMarketStore>,
    scorer: Arc<Scorer>,
) -> SettlementCoordinator {
    let ledger = build_ledger(config, pool, Arc::clone(&markets));
    let checkpoints = Arc::new(SqliteCheckpointStore::new(pool.clone()));
    SettlementCoordinator::new(
        scorer,
        markets.clone(),
        markets,
        ledger,
        checkpoints,
        Authority::new(&config.ledger.authority),
    )
}
