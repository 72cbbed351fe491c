//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the settlement engine's use cases.

pub mod monitor;
pub mod scoring;
pub mod settlement;
