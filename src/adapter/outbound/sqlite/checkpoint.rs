//! SQLite checkpoint store.
//!
//! One row per market. The first writer wins; later saves read back the
//! stored row instead of replacing it.

use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug;

use super::database::connection::DbPool;
use super::database::model::CheckpointRow;
use super::database::schema::settlement_checkpoints;
use super::database::timestamp;
use crate::domain::{MarketId, SettlementCheckpoint};
use crate::error::{Error, Result};
use crate::port::outbound::checkpoint::CheckpointStore;

pub struct SqliteCheckpointStore {
    pool: DbPool,
}

impl SqliteCheckpointStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load_row(conn: &mut SqliteConnection, market: &str) -> Result<Option<SettlementCheckpoint>> {
        let row: Option<CheckpointRow> = settlement_checkpoints::table
            .find(market)
            .select(CheckpointRow::as_select())
            .first(conn)
            .optional()?;
        row.map(|r| serde_json::from_str(&r.payload).map_err(Error::from))
            .transpose()
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, market: &MarketId) -> Result<Option<SettlementCheckpoint>> {
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        Self::load_row(&mut conn, market.as_str())
    }

    async fn save(&self, checkpoint: SettlementCheckpoint) -> Result<SettlementCheckpoint> {
        let row = CheckpointRow {
            market_id: checkpoint.market_id.to_string(),
            payload: serde_json::to_string(&checkpoint)?,
            created_at: timestamp(checkpoint.created_at),
        };

        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        let inserted = diesel::insert_or_ignore_into(settlement_checkpoints::table)
            .values(&row)
            .execute(&mut conn)?;
        if inserted == 0 {
            debug!(market = %checkpoint.market_id, "checkpoint already stored");
        }

        Self::load_row(&mut conn, &row.market_id)?.ok_or_else(|| Error::NotFound {
            what: "checkpoint",
            id: row.market_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::open;
    use crate::domain::MarketState;
    use crate::testkit::domain::{checkpoint, market, opinion};

    fn store() -> (tempfile::TempDir, SqliteCheckpointStore) {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir.path().join("c.db").display().to_string()).unwrap();
        (dir, SqliteCheckpointStore::new(pool))
    }

    #[tokio::test]
    async fn load_before_save_is_none() {
        let (_dir, store) = store();
        assert!(store.load(&MarketId::new("m")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_save_wins() {
        let (_dir, store) = store();
        let m = market(
            "m-1",
            MarketState::Closed,
            vec![opinion("a", 1_000_000, 80, 70), opinion("b", 2_000_000, 40, 50)],
        );

        let first = store.save(checkpoint(&m, &[60, 60], 1)).await.unwrap();
        let second = store.save(checkpoint(&m, &[10, 90], 2)).await.unwrap();

        assert_eq!(second, first);
        assert_eq!(store.load(&m.id).await.unwrap(), Some(first));
    }
}
