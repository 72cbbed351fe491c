//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for opinions, markets, jobs, and checkpoints.
//! - [`llm`] - Scripted LLM clients and opinion raters.
//! - [`memory`] - In-memory market store, job queue, and checkpoint store.
//! - [`ledger`] - Ledger wrapper that injects transient failures.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod ledger;
pub mod llm;
pub mod memory;
