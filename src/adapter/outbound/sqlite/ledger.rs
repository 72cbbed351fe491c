//! SQLite journal for the simulated ledger.
//!
//! One JSON row per market, replaced on every ledger instruction.

use chrono::Utc;
use diesel::prelude::*;

use super::database::connection::DbPool;
use super::database::model::LedgerRecordRow;
use super::database::schema::ledger_records;
use super::database::timestamp;
use crate::adapter::outbound::ledger::{LedgerJournal, LedgerRecord};
use crate::domain::MarketId;
use crate::error::{Error, Result};

pub struct SqliteLedgerJournal {
    pool: DbPool,
}

impl SqliteLedgerJournal {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl LedgerJournal for SqliteLedgerJournal {
    fn load(&self, market: &MarketId) -> Result<Option<LedgerRecord>> {
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        let row: Option<LedgerRecordRow> = ledger_records::table
            .find(market.as_str())
            .select(LedgerRecordRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|r| serde_json::from_str(&r.payload).map_err(Error::from))
            .transpose()
    }

    fn save(&self, market: &MarketId, record: &LedgerRecord) -> Result<()> {
        let row = LedgerRecordRow {
            market_id: market.to_string(),
            payload: serde_json::to_string(record)?,
            updated_at: timestamp(Utc::now()),
        };
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        diesel::replace_into(ledger_records::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::ledger::Claim;
    use crate::adapter::outbound::sqlite::database::connection::open;
    use crate::domain::{MarketState, OpinionId, StakerId};

    fn journal() -> (tempfile::TempDir, SqliteLedgerJournal) {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir.path().join("l.db").display().to_string()).unwrap();
        (dir, SqliteLedgerJournal::new(pool))
    }

    #[test]
    fn saved_record_reloads_and_is_replaced() {
        let (_dir, journal) = journal();
        let id = MarketId::new("m-1");
        assert!(journal.load(&id).unwrap().is_none());

        let mut record = LedgerRecord {
            state: Some(MarketState::Scored),
            total_stake: 5_000_000,
            escrow: 5_000_000,
            ..LedgerRecord::default()
        };
        journal.save(&id, &record).unwrap();

        record.state = Some(MarketState::Settled);
        record.claims.insert(
            OpinionId::new("a"),
            Claim {
                staker: StakerId::new("staker-a"),
                amount: 731_475,
                claimed: true,
            },
        );
        journal.save(&id, &record).unwrap();

        assert_eq!(journal.load(&id).unwrap(), Some(record));
    }
}
