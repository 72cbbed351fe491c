use std::sync::Arc;

use crowdsettle::adapter::outbound::sqlite::{self, DbPool, SqliteMarketStore};
use crowdsettle::infrastructure::config::settings::Config;

/// Temporary on-disk SQLite database for integration tests.
///
/// Removed with its directory when dropped.
pub struct TempDb {
    _dir: tempfile::TempDir,
    path: String,
    pool: DbPool,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("crowdsettle.db").display().to_string();
        let pool = sqlite::open(&path).expect("open sqlite database");
        Self {
            _dir: dir,
            path,
            pool,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn markets(&self) -> Arc<SqliteMarketStore> {
        Arc::new(SqliteMarketStore::new(self.pool.clone()))
    }

    /// Default config pointing at this database.
    pub fn config(&self) -> Config {
        Config {
            database: self.path.clone(),
            ..Config::default()
        }
    }
}
