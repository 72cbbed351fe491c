//! Database row types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{ledger_records, markets, opinions, settlement_checkpoints, settlement_jobs};

/// Core columns of a market row.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub id: String,
    pub statement: String,
    pub state: String,
    pub created_at: String,
    pub closes_at: String,
    pub total_stake: i64,
}

/// Settlement result columns written when a market settles.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = markets)]
pub struct MarketSettlementChangeset {
    pub state: String,
    pub crowd_score: Option<i32>,
    pub sentiment_score: Option<i32>,
    pub sentiment_confidence: Option<String>,
    pub sentiment_summary: Option<String>,
    pub settled_at: Option<String>,
}

/// Live sentiment columns.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = markets)]
pub struct LiveSentimentChangeset {
    pub live_score: Option<i32>,
    pub live_crowd_score: Option<i32>,
    pub live_ai_score: Option<i32>,
    pub live_confidence: Option<String>,
    pub live_updated_at: Option<String>,
}

/// Live sentiment as read back for display.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LiveSentimentRow {
    pub live_score: Option<i32>,
    pub live_crowd_score: Option<i32>,
    pub live_ai_score: Option<i32>,
    pub live_confidence: Option<String>,
    pub live_updated_at: Option<String>,
}

/// Input columns of an opinion row.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = opinions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OpinionRow {
    pub market_id: String,
    pub id: String,
    pub position: i32,
    pub staker: String,
    pub stake: i64,
    pub text: String,
    pub opinion_score: i32,
    pub market_prediction: i32,
    pub backing_total: i64,
    pub slashing_total: i64,
}

/// Per-opinion settlement result columns.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = opinions)]
pub struct OpinionScoreChangeset {
    pub weight_score: Option<i32>,
    pub ai_score: Option<i32>,
    pub prediction_score: Option<i32>,
    pub combined_score: Option<i32>,
    pub payout_amount: Option<i64>,
    pub jackpot_eligible: Option<bool>,
    pub jackpot_winner: Option<bool>,
    pub jackpot_amount: Option<i64>,
    pub net_backing: Option<i64>,
    pub opinion_payout: Option<i64>,
    pub prediction_payout: Option<i64>,
}

/// Per-opinion settlement result as read back.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = opinions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OpinionScoreRow {
    pub id: String,
    pub weight_score: Option<i32>,
    pub ai_score: Option<i32>,
    pub prediction_score: Option<i32>,
    pub combined_score: Option<i32>,
    pub payout_amount: Option<i64>,
    pub jackpot_eligible: Option<bool>,
    pub jackpot_winner: Option<bool>,
    pub jackpot_amount: Option<i64>,
    pub net_backing: Option<i64>,
    pub opinion_payout: Option<i64>,
    pub prediction_payout: Option<i64>,
}

/// Queue row for a settlement job.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = settlement_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JobRow {
    pub id: String,
    pub market_id: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub available_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Stored scoring checkpoint.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = settlement_checkpoints)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CheckpointRow {
    pub market_id: String,
    pub payload: String,
    pub created_at: String,
}

/// Journaled ledger record.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = ledger_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerRecordRow {
    pub market_id: String,
    pub payload: String,
    pub updated_at: String,
}
