//! Domain validation errors.
//!
//! Returned by validating constructors such as
//! [`SettlementJob::new`](crate::domain::SettlementJob::new) when a snapshot
//! violates the rules every settlement input must satisfy.
//!
//! # Examples
//!
//! ```
//! use crowdsettle::domain::error::DomainError;
//! use crowdsettle::domain::{MarketId, SettlementJob};
//!
//! let result = SettlementJob::new(MarketId::new("m-1"), "   ", vec![], 0);
//! assert!(matches!(result, Err(DomainError::EmptyStatement)));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Market statements must contain text.
    #[error("statement cannot be empty")]
    EmptyStatement,

    /// A percentage-style field left the 0..=100 range.
    #[error("{field} of opinion {opinion} must be between 0 and 100, got {value}")]
    ScoreOutOfRange {
        /// Opinion carrying the bad value.
        opinion: String,
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: u8,
    },

    /// Opinion identifiers must be unique within a market.
    #[error("duplicate opinion {opinion}")]
    DuplicateOpinion {
        /// The repeated identifier.
        opinion: String,
    },

    /// Confidence tiers are 0, 1, or 2.
    #[error("unknown confidence tier {0}")]
    UnknownConfidence(u8),

    /// Only closed markets can be queued for settlement.
    #[error("market {market} is {state}, only closed markets can be settled")]
    NotClosed {
        /// The market.
        market: String,
        /// Its current state.
        state: String,
    },

    /// Unrecognised market state label.
    #[error("unknown market state '{0}'")]
    UnknownMarketState(String),
}
