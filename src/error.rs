use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures of the external opinion rating service.
///
/// Every variant is recoverable: callers substitute neutral scores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("rating request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("malformed rating response: {0}")]
    Malformed(String),

    #[error("rating response has {actual} scores, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("rating score {0} outside 0..=100")]
    OutOfRange(i64),
}

/// Errors returned by the settlement ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unauthorized: {caller} is not the settlement authority")]
    Unauthorized { caller: String },

    #[error("market {0} has no escrow on the ledger")]
    UnknownMarket(String),

    #[error("market {market} is {actual}, expected {expected}")]
    InvalidState {
        market: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("score {0} must be between 0 and 100")]
    InvalidScore(u8),

    #[error("confidence {0} must be 0 (low), 1 (medium), or 2 (high)")]
    InvalidConfidence(u8),

    #[error("prize pool is zero for market {0}")]
    EmptyPrizePool(String),

    #[error("payout plan {planned} exceeds distributable pool {distributable}")]
    Overdraft { planned: u64, distributable: u64 },

    #[error("{what} already claimed for market {market}")]
    AlreadyClaimed { market: String, what: String },

    #[error("nothing to claim for {what} in market {market}")]
    NothingToClaim { market: String, what: String },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("{what} timed out after {secs}s")]
    Timeout { what: &'static str, secs: u64 },
}

impl Error {
    /// Whether a settlement attempt failing with this error should be retried.
    ///
    /// Invalid input, bad configuration, and ledger rejections that no amount
    /// of waiting can fix are surfaced immediately.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Domain(_) | Self::NotFound { .. } => false,
            Self::Ledger(e) => !matches!(
                e,
                LedgerError::Unauthorized { .. }
                    | LedgerError::InvalidScore(_)
                    | LedgerError::InvalidConfidence(_)
                    | LedgerError::Overdraft { .. }
                    | LedgerError::EmptyPrizePool(_)
            ),
            _ => true,
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_rejections_are_permanent() {
        let err = Error::from(LedgerError::Unauthorized {
            caller: "mallory".into(),
        });
        assert!(!err.is_retryable());

        let err = Error::from(LedgerError::Overdraft {
            planned: 10,
            distributable: 9,
        });
        assert!(!err.is_retryable());
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(Error::from(LedgerError::Unavailable("rpc down".into())).is_retryable());
        assert!(Error::Connection("reset".into()).is_retryable());
        assert!(Error::Database("locked".into()).is_retryable());
        assert!(Error::Timeout {
            what: "settlement",
            secs: 300
        }
        .is_retryable());
    }

    #[test]
    fn invalid_input_is_permanent() {
        let err = Error::from(DomainError::EmptyStatement);
        assert!(!err.is_retryable());
    }

    #[test]
    fn config_error_messages_name_the_field() {
        let err = ConfigError::InvalidValue {
            field: "workers",
            reason: "must be greater than 0".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for workers: must be greater than 0"
        );
    }
}
