//! SQLite persistence adapters.
//!
//! Provides the market mirror, the durable settlement job queue, the
//! scoring checkpoint store, and the ledger journal using Diesel ORM.

pub mod checkpoint;
pub mod database;
pub mod ledger;
pub mod market;
pub mod queue;

pub use checkpoint::SqliteCheckpointStore;
pub use database::connection::{open, DbPool};
pub use ledger::SqliteLedgerJournal;
pub use market::SqliteMarketStore;
pub use queue::SqliteJobQueue;
