//! Embedded migrations for the registry, pair and news staging tables.

use anyhow::{Context, anyhow};
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::db::connection::{connect_sqlite, sqlite_path};

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending Diesel migrations on the SQLite database at `url`.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = SqliteConnection::establish(sqlite_path(url))
        .with_context(|| format!("opening warehouse {}", sqlite_path(url)))?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;
    if !applied.is_empty() {
        info!(count = applied.len(), "applied migrations");
    }
    Ok(())
}

/// Migrate, then open a tuned connection.
pub fn open_warehouse(url: &str) -> anyhow::Result<SqliteConnection> {
    run_sqlite(url).context("running warehouse migrations")?;
    connect_sqlite(url).context("connecting to warehouse")
}
