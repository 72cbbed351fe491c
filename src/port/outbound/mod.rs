//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the settlement engine's infrastructure
//! dependencies: the rating service, market storage, the ledger, the job
//! queue, and the checkpoint store.

pub mod checkpoint;
pub mod ledger;
pub mod llm;
pub mod query;
pub mod queue;
pub mod rating;
pub mod store;
