//! Outbound adapters (driven side).

pub mod ledger;
pub mod llm;
pub mod rating;
pub mod sqlite;
