//! Strongly-typed settlement job records.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{JobId, MarketId};
use super::market::Market;
use super::opinion::Opinion;

/// Snapshot of everything needed to settle one market.
///
/// Validated on construction so workers never see a malformed payload.
/// Zero stakes are valid. A stated total below the sum of stakes is kept as
/// given; callers check [`SettlementJob::is_underfunded`] and pick the escrow
/// they trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementJob {
    market_id: MarketId,
    statement: String,
    opinions: Vec<Opinion>,
    total_stake: u64,
}

impl SettlementJob {
    /// Build and validate a job.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the statement is blank or an opinion has a
    /// duplicate id or a score outside 0..=100.
    pub fn new(
        market_id: MarketId,
        statement: impl Into<String>,
        opinions: Vec<Opinion>,
        total_stake: u64,
    ) -> Result<Self, DomainError> {
        let statement = statement.into();
        if statement.trim().is_empty() {
            return Err(DomainError::EmptyStatement);
        }

        let mut seen = HashSet::with_capacity(opinions.len());
        for op in &opinions {
            if !seen.insert(op.id.clone()) {
                return Err(DomainError::DuplicateOpinion {
                    opinion: op.id.to_string(),
                });
            }
            for (field, value) in [
                ("opinion_score", op.opinion_score),
                ("market_prediction", op.market_prediction),
            ] {
                if value > 100 {
                    return Err(DomainError::ScoreOutOfRange {
                        opinion: op.id.to_string(),
                        field,
                        value,
                    });
                }
            }
        }

        Ok(Self {
            market_id,
            statement,
            opinions,
            total_stake,
        })
    }

    /// Build a job from a fetched market.
    ///
    /// # Errors
    ///
    /// See [`SettlementJob::new`].
    pub fn from_market(market: Market) -> Result<Self, DomainError> {
        Self::new(
            market.id,
            market.statement,
            market.opinions,
            market.total_stake,
        )
    }

    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn opinions(&self) -> &[Opinion] {
        &self.opinions
    }

    #[must_use]
    pub fn total_stake(&self) -> u64 {
        self.total_stake
    }

    /// Sum of the individual opinion stakes.
    #[must_use]
    pub fn stake_sum(&self) -> u64 {
        self.opinions
            .iter()
            .fold(0u64, |acc, op| acc.saturating_add(op.stake))
    }

    /// Whether the stated total is below the sum of opinion stakes.
    #[must_use]
    pub fn is_underfunded(&self) -> bool {
        self.total_stake < self.stake_sum()
    }
}

/// Queue status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job handed to a worker by the queue.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: JobId,
    pub job: SettlementJob,
    /// 1-based number of this delivery.
    pub attempt: u32,
}

/// A job parked for operator attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    pub id: JobId,
    pub market_id: MarketId,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub failed_at: DateTime<Utc>,
}
