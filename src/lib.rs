//! Crowdsettle - settlement engine for crowd opinion markets.
//!
//! Participants stake on opinions about a statement. When a market closes,
//! crowdsettle scores every opinion, splits the escrow into an opinion pool,
//! a prediction pool, and a jackpot, and drives the ledger through
//! finalization and payout claims.
//!
//! # Architecture
//!
//! - [`domain`] - Pure types and scoring math (crowd score, Layers 1-3,
//!   pool split, jackpot draw). No I/O.
//! - [`port`] - Traits for every external collaborator: rater, market query
//!   and store, ledger, job queue, checkpoints.
//! - [`adapter`] - LLM clients, the simulated ledger, SQLite persistence,
//!   and the CLI.
//! - [`application`] - The scorer, the settlement coordinator and worker
//!   pool, and the settlement and live monitors.
//! - [`infrastructure`] - Configuration, logging, and runtime wiring.
//!
//! # Example
//!
//! ```
//! use crowdsettle::domain::scoring::compute_distribution;
//! use crowdsettle::domain::Opinion;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let opinions = vec![
//!     Opinion::new("a", "alice", 1_000_000, "yes", 80, 70),
//!     Opinion::new("b", "bob", 1_000_000, "no", 20, 40),
//! ];
//! let mut rng = StdRng::seed_from_u64(7);
//! let distribution = compute_distribution(&opinions, &[60, 40], 2_000_000, &mut rng);
//! assert_eq!(distribution.pools.distributable, 1_800_000);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
