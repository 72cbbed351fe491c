//! Durable settlement job queue on SQLite.
//!
//! A claim runs inside an immediate transaction so concurrent workers never
//! take the same job. A running job holds a lease; if its worker dies the
//! lease expires and the job becomes claimable again.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, error};

use super::database::connection::DbPool;
use super::database::model::JobRow;
use super::database::schema::settlement_jobs;
use super::database::{parse_timestamp, timestamp};
use crate::domain::{ClaimedJob, FailedJob, JobId, JobStatus, MarketId, SettlementJob};
use crate::error::{Error, Result};
use crate::port::outbound::queue::JobQueue;

/// Longest delay honored by `retry`.
const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 3600);

pub struct SqliteJobQueue {
    pool: DbPool,
    lease: Duration,
}

impl SqliteJobQueue {
    /// `lease` bounds how long a claimed job stays invisible to other
    /// workers; it must exceed the job timeout.
    #[must_use]
    pub fn new(pool: DbPool, lease: Duration) -> Self {
        Self { pool, lease }
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>>
    {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn after(delay: Duration) -> String {
        let delay = chrono::Duration::from_std(delay.min(MAX_DELAY)).unwrap_or_default();
        timestamp(Utc::now() + delay)
    }

    fn set_status(&self, id: &JobId, status: JobStatus, delay: Duration, error: Option<&str>) -> Result<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(settlement_jobs::table.find(id.as_str()))
            .set((
                settlement_jobs::status.eq(status.as_str()),
                settlement_jobs::available_at.eq(Self::after(delay)),
                settlement_jobs::last_error.eq(error),
                settlement_jobs::updated_at.eq(timestamp(Utc::now())),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                what: "job",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Number of jobs in each status, for operator display.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn counts(&self) -> Result<Vec<(String, i64)>> {
        let mut conn = self.conn()?;
        Ok(settlement_jobs::table
            .group_by(settlement_jobs::status)
            .select((settlement_jobs::status, diesel::dsl::count_star()))
            .order(settlement_jobs::status.asc())
            .load(&mut conn)?)
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: SettlementJob) -> Result<JobId> {
        let id = JobId::generate();
        let now = timestamp(Utc::now());
        let row = JobRow {
            id: id.to_string(),
            market_id: job.market_id().to_string(),
            payload: serde_json::to_string(&job)?,
            status: JobStatus::Queued.as_str().to_string(),
            attempts: 0,
            last_error: None,
            available_at: now.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        let mut conn = self.conn()?;
        diesel::insert_into(settlement_jobs::table)
            .values(&row)
            .execute(&mut conn)?;
        debug!(job = %id, market = %job.market_id(), "job enqueued");
        Ok(id)
    }

    async fn claim(&self) -> Result<Option<ClaimedJob>> {
        let lease_until = Self::after(self.lease);
        let mut conn = self.conn()?;

        let claimed = conn.immediate_transaction::<_, Error, _>(|conn| {
            let now = timestamp(Utc::now());
            let queued = JobStatus::Queued.as_str();
            let running = JobStatus::Running.as_str();

            let busy: Vec<String> = settlement_jobs::table
                .filter(settlement_jobs::status.eq(running))
                .filter(settlement_jobs::available_at.gt(&now))
                .select(settlement_jobs::market_id)
                .load(conn)?;

            let candidate: Option<JobRow> = settlement_jobs::table
                .filter(
                    settlement_jobs::status
                        .eq(queued)
                        .or(settlement_jobs::status.eq(running)),
                )
                .filter(settlement_jobs::available_at.le(&now))
                .filter(settlement_jobs::market_id.ne_all(busy))
                .order((settlement_jobs::created_at.asc(), settlement_jobs::id.asc()))
                .select(JobRow::as_select())
                .first(conn)
                .optional()?;

            let Some(row) = candidate else {
                return Ok(None);
            };

            let attempts = row.attempts + 1;
            diesel::update(settlement_jobs::table.find(row.id.as_str()))
                .set((
                    settlement_jobs::status.eq(running),
                    settlement_jobs::attempts.eq(attempts),
                    settlement_jobs::available_at.eq(&lease_until),
                    settlement_jobs::updated_at.eq(&now),
                ))
                .execute(conn)?;

            match serde_json::from_str::<SettlementJob>(&row.payload) {
                Ok(job) => Ok(Some(ClaimedJob {
                    id: JobId::from(row.id),
                    job,
                    attempt: u32::try_from(attempts).unwrap_or(u32::MAX),
                })),
                Err(e) => {
                    let reason = format!("unreadable payload: {e}");
                    diesel::update(settlement_jobs::table.find(row.id.as_str()))
                        .set((
                            settlement_jobs::status.eq(JobStatus::Failed.as_str()),
                            settlement_jobs::last_error.eq(&reason),
                        ))
                        .execute(conn)?;
                    error!(job = %row.id, market = %row.market_id, error = %reason, "job parked");
                    Ok(None)
                }
            }
        })?;

        Ok(claimed)
    }

    async fn complete(&self, id: &JobId) -> Result<()> {
        self.set_status(id, JobStatus::Completed, Duration::ZERO, None)
    }

    async fn retry(&self, id: &JobId, delay: Duration, error: &str) -> Result<()> {
        self.set_status(id, JobStatus::Queued, delay, Some(error))
    }

    async fn fail(&self, id: &JobId, error: &str) -> Result<()> {
        self.set_status(id, JobStatus::Failed, Duration::ZERO, Some(error))
    }

    async fn failed(&self) -> Result<Vec<FailedJob>> {
        let mut conn = self.conn()?;
        let rows: Vec<JobRow> = settlement_jobs::table
            .filter(settlement_jobs::status.eq(JobStatus::Failed.as_str()))
            .order(settlement_jobs::updated_at.asc())
            .select(JobRow::as_select())
            .load(&mut conn)?;

        rows.into_iter()
            .map(|row| {
                Ok(FailedJob {
                    id: JobId::from(row.id),
                    market_id: MarketId::from(row.market_id),
                    attempts: u32::try_from(row.attempts).unwrap_or(0),
                    last_error: row.last_error,
                    failed_at: parse_timestamp(&row.updated_at)?,
                })
            })
            .collect()
    }

    async fn requeue(&self, id: &JobId) -> Result<bool> {
        let now = timestamp(Utc::now());
        let mut conn = self.conn()?;
        let updated = diesel::update(
            settlement_jobs::table
                .filter(settlement_jobs::id.eq(id.as_str()))
                .filter(settlement_jobs::status.eq(JobStatus::Failed.as_str())),
        )
        .set((
            settlement_jobs::status.eq(JobStatus::Queued.as_str()),
            settlement_jobs::attempts.eq(0),
            settlement_jobs::available_at.eq(&now),
            settlement_jobs::updated_at.eq(&now),
        ))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }
}
