//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support, and per-connection
//! pragmas for the settlement database.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Applies pragmas to every connection the pool hands out.
#[derive(Debug, Clone, Copy)]
struct Pragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for Pragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA busy_timeout=5000")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        diesel::sql_query("PRAGMA foreign_keys=ON")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        Ok(())
    }
}

/// Create a connection pool for the given database path.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(5)
        .connection_customizer(Box::new(Pragmas))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Connection(e.to_string()))?;
    Ok(())
}

/// Switch the database to write-ahead logging.
///
/// Persistent, so one call per database file is enough.
///
/// # Errors
/// Returns an error if the pragma fails to apply.
pub fn enable_wal(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    diesel::sql_query("PRAGMA journal_mode=WAL").execute(&mut conn)?;
    Ok(())
}

/// Open a file-backed database with migrations applied.
///
/// # Errors
/// Returns an error if the pool, the WAL switch, or migrations fail.
pub fn open(path: &str) -> Result<DbPool> {
    let pool = create_pool(path)?;
    enable_wal(&pool)?;
    run_migrations(&pool)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct Timeout {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        timeout: i64,
    }

    fn temp_path(dir: &tempfile::TempDir) -> String {
        dir.path().join("settle.db").display().to_string()
    }

    #[test]
    fn open_creates_settlement_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&temp_path(&dir)).unwrap();
        let mut conn = pool.get().unwrap();

        let names: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load::<TableName>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

        assert_eq!(
            names,
            vec![
                "markets",
                "opinions",
                "settlement_checkpoints",
                "settlement_jobs"
            ]
        );
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&temp_path(&dir)).unwrap();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();
    }

    #[test]
    fn pooled_connections_get_busy_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&temp_path(&dir)).unwrap();
        let mut conn = pool.get().unwrap();

        let rows: Vec<Timeout> = diesel::sql_query("PRAGMA busy_timeout")
            .load(&mut conn)
            .unwrap();
        assert_eq!(rows[0].timeout, 5000);
    }
}
