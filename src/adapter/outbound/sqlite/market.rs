//! SQLite market mirror.
//!
//! Serves the query side to the monitors and coordinator, and receives the
//! settlement and live-sentiment write-backs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;

use super::database::connection::DbPool;
use super::database::model::{
    LiveSentimentChangeset, LiveSentimentRow, MarketRow, MarketSettlementChangeset,
    OpinionRow, OpinionScoreChangeset, OpinionScoreRow,
};
use super::database::schema::{markets, opinions};
use super::database::{
    from_db_amount, from_db_score, parse_timestamp, timestamp, to_db_amount, to_db_signed,
};
use crate::domain::{
    LiveSentiment, Market, MarketId, MarketState, MarketSummary, Opinion, SettlementCheckpoint,
};
use crate::error::{Error, Result};
use crate::port::outbound::query::{MarketQuery, Page, PageRequest};
use crate::port::outbound::store::SettlementStore;

pub struct SqliteMarketStore {
    pool: DbPool,
}

impl SqliteMarketStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>>
    {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    /// Insert or replace a market and its opinion set.
    ///
    /// This is the write path of the market service; settlement never calls
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure or out-of-range amounts.
    pub fn upsert_market(&self, market: &Market) -> Result<()> {
        let row = MarketRow {
            id: market.id.to_string(),
            statement: market.statement.clone(),
            state: market.state.as_str().to_string(),
            created_at: timestamp(market.created_at),
            closes_at: timestamp(market.closes_at),
            total_stake: to_db_amount(market.total_stake)?,
        };
        let opinion_rows = market
            .opinions
            .iter()
            .enumerate()
            .map(|(position, op)| {
                Ok(OpinionRow {
                    market_id: market.id.to_string(),
                    id: op.id.to_string(),
                    position: i32::try_from(position)
                        .map_err(|_| Error::Parse("too many opinions".into()))?,
                    staker: op.staker.to_string(),
                    stake: to_db_amount(op.stake)?,
                    text: op.text.clone(),
                    opinion_score: i32::from(op.opinion_score),
                    market_prediction: i32::from(op.market_prediction),
                    backing_total: to_db_amount(op.backing_total)?,
                    slashing_total: to_db_amount(op.slashing_total)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn()?;
        conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(markets::table)
                .values(&row)
                .on_conflict(markets::id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            diesel::delete(opinions::table.filter(opinions::market_id.eq(&row.id))).execute(conn)?;
            if !opinion_rows.is_empty() {
                diesel::insert_into(opinions::table)
                    .values(&opinion_rows)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    /// Move a market to a new lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the market does not exist.
    pub fn set_state(&self, id: &MarketId, state: MarketState) -> Result<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(markets::table.find(id.as_str()))
            .set(markets::state.eq(state.as_str()))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                what: "market",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Stored settlement result per opinion, in opinion order.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn opinion_results(&self, id: &MarketId) -> Result<Vec<OpinionScoreRow>> {
        let mut conn = self.conn()?;
        Ok(opinions::table
            .filter(opinions::market_id.eq(id.as_str()))
            .order(opinions::position.asc())
            .select(OpinionScoreRow::as_select())
            .load(&mut conn)?)
    }

    /// Stored live sentiment columns.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn live_sentiment(&self, id: &MarketId) -> Result<Option<LiveSentimentRow>> {
        let mut conn = self.conn()?;
        Ok(markets::table
            .find(id.as_str())
            .select(LiveSentimentRow::as_select())
            .first(&mut conn)
            .optional()?)
    }

    /// Stored crowd score in hundredths, set once the market settles.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn crowd_score(&self, id: &MarketId) -> Result<Option<i32>> {
        let mut conn = self.conn()?;
        Ok(markets::table
            .find(id.as_str())
            .select(markets::crowd_score)
            .first::<Option<i32>>(&mut conn)
            .optional()?
            .flatten())
    }

    fn summary_from_row(row: MarketRow, opinion_count: usize) -> Result<MarketSummary> {
        Ok(MarketSummary {
            id: MarketId::from(row.id),
            statement: row.statement,
            state: row.state.parse()?,
            closes_at: parse_timestamp(&row.closes_at)?,
            opinion_count,
            total_stake: from_db_amount(row.total_stake)?,
        })
    }

    fn opinion_from_row(row: OpinionRow) -> Result<Opinion> {
        Ok(Opinion::new(
            row.id,
            row.staker,
            from_db_amount(row.stake)?,
            row.text,
            from_db_score(row.opinion_score)?,
            from_db_score(row.market_prediction)?,
        )
        .with_peer_totals(
            from_db_amount(row.backing_total)?,
            from_db_amount(row.slashing_total)?,
        ))
    }
}

#[async_trait]
impl MarketQuery for SqliteMarketStore {
    async fn list_markets(
        &self,
        state: MarketState,
        page: PageRequest,
    ) -> Result<Page<MarketSummary>> {
        let mut conn = self.conn()?;
        let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset).unwrap_or(i64::MAX);

        let mut rows: Vec<MarketRow> = markets::table
            .filter(markets::state.eq(state.as_str()))
            .order((markets::closes_at.asc(), markets::id.asc()))
            .limit(limit.saturating_add(1))
            .offset(offset)
            .select(MarketRow::as_select())
            .load(&mut conn)?;

        let next = (rows.len() > page.limit).then(|| PageRequest {
            offset: page.offset + page.limit,
            limit: page.limit,
        });
        rows.truncate(page.limit);

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        let counts: HashMap<String, i64> = opinions::table
            .filter(opinions::market_id.eq_any(ids))
            .group_by(opinions::market_id)
            .select((opinions::market_id, count_star()))
            .load::<(String, i64)>(&mut conn)?
            .into_iter()
            .collect();

        let items = rows
            .into_iter()
            .map(|row| {
                let count = counts.get(&row.id).copied().unwrap_or(0) as usize;
                Self::summary_from_row(row, count)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page { items, next })
    }

    async fn market(&self, id: &MarketId) -> Result<Option<Market>> {
        let mut conn = self.conn()?;
        let Some(row) = markets::table
            .find(id.as_str())
            .select(MarketRow::as_select())
            .first(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        let opinion_rows: Vec<OpinionRow> = opinions::table
            .filter(opinions::market_id.eq(id.as_str()))
            .order(opinions::position.asc())
            .select(OpinionRow::as_select())
            .load(&mut conn)?;

        Ok(Some(Market {
            id: MarketId::from(row.id),
            statement: row.statement,
            state: row.state.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
            closes_at: parse_timestamp(&row.closes_at)?,
            total_stake: from_db_amount(row.total_stake)?,
            opinions: opinion_rows
                .into_iter()
                .map(Self::opinion_from_row)
                .collect::<Result<Vec<_>>>()?,
        }))
    }
}

#[async_trait]
impl SettlementStore for SqliteMarketStore {
    async fn mark_settled(&self, id: &MarketId, checkpoint: &SettlementCheckpoint) -> Result<()> {
        let distribution = &checkpoint.distribution;
        let jackpot = distribution.jackpot.as_ref();
        let market_changes = MarketSettlementChangeset {
            state: MarketState::Settled.as_str().to_string(),
            crowd_score: Some(i32::from(distribution.crowd_score.hundredths())),
            sentiment_score: Some(i32::from(checkpoint.rating.score)),
            sentiment_confidence: Some(checkpoint.rating.confidence.to_string()),
            sentiment_summary: Some(checkpoint.rating.summary.clone()),
            settled_at: Some(timestamp(Utc::now())),
        };
        let opinion_changes = distribution
            .opinions
            .iter()
            .map(|o| {
                let jackpot_amount = match jackpot {
                    Some(j) if &j.opinion_id == o.id() => j.amount,
                    _ => 0,
                };
                Ok((
                    o.id().to_string(),
                    OpinionScoreChangeset {
                        weight_score: Some(i32::from(o.weight_score)),
                        ai_score: Some(i32::from(o.ai_score)),
                        prediction_score: Some(i32::from(o.prediction_score)),
                        combined_score: Some(i32::from(o.combined_score)),
                        payout_amount: Some(to_db_amount(o.payout_amount)?),
                        jackpot_eligible: Some(o.jackpot_eligible),
                        jackpot_winner: Some(o.jackpot_winner),
                        jackpot_amount: Some(to_db_amount(jackpot_amount)?),
                        net_backing: Some(to_db_signed(o.net_backing)?),
                        opinion_payout: Some(to_db_amount(o.opinion_payout)?),
                        prediction_payout: Some(to_db_amount(o.prediction_payout)?),
                    },
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn()?;
        conn.transaction::<_, Error, _>(|conn| {
            let updated = diesel::update(markets::table.find(id.as_str()))
                .set(&market_changes)
                .execute(conn)?;
            if updated == 0 {
                return Err(Error::NotFound {
                    what: "market",
                    id: id.to_string(),
                });
            }
            for (opinion_id, changes) in &opinion_changes {
                diesel::update(opinions::table.find((id.as_str(), opinion_id.as_str())))
                    .set(changes)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    async fn record_live_sentiment(&self, live: &LiveSentiment) -> Result<()> {
        let changes = LiveSentimentChangeset {
            live_score: Some(i32::from(live.blended_score)),
            live_crowd_score: Some(i32::from(live.crowd_score.hundredths())),
            live_ai_score: Some(i32::from(live.ai_score)),
            live_confidence: Some(live.confidence.to_string()),
            live_updated_at: Some(timestamp(live.measured_at)),
        };
        let mut conn = self.conn()?;
        let updated = diesel::update(markets::table.find(live.market_id.as_str()))
            .set(&changes)
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                what: "market",
                id: live.market_id.to_string(),
            });
        }
        Ok(())
    }
}
