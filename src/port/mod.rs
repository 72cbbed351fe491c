//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points of the settlement engine. Every
//! external collaborator sits behind one of these traits, so the scorer,
//! coordinator, and monitors can be exercised without a network, a ledger,
//! or a database.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  Scorer / Coordinator / │
//!                    │        Monitors         │
//!                    └────────────┬────────────┘
//!     ┌──────────────┬────────────┼────────────┬──────────────┐
//!     ▼              ▼            ▼            ▼              ▼
//! ┌────────┐   ┌──────────┐  ┌─────────┐  ┌─────────┐   ┌───────────┐
//! │ Rater  │   │  Query / │  │ Ledger  │  │  Queue  │   │Checkpoints│
//! │ (LLM)  │   │  Store   │  │         │  │         │   │           │
//! └────────┘   └──────────┘  └─────────┘  └─────────┘   └───────────┘
//! ```

pub mod outbound;

pub use outbound::checkpoint::CheckpointStore;
pub use outbound::ledger::{
    FinalizeReceipt, LayerScores, Ledger, LedgerMarket, OpinionAiScore, PayoutLine, PayoutPlan,
};
pub use outbound::llm::Llm;
pub use outbound::query::{MarketQuery, Page, PageRequest};
pub use outbound::queue::JobQueue;
pub use outbound::rating::OpinionRater;
pub use outbound::store::SettlementStore;
