//! Database initialization
//!
//! Startup sequence:
//! 1. Open (or create) the SQLite file, enable WAL and a busy timeout
//! 2. On a dedicated setup connection, evolve an existing `uld` table to the
//!    current column set, then create the table and its unique index if missing
//! 3. Open the serving pool
//!
//! Serving connections are only opened after all DDL has committed, so none
//! of them starts out with a schema that lacks the unique index.

use crate::config::ReportDefaults;
use crate::db::table_schemas::ensure_schema;
use crate::db::uld_repository::UldRepository;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT_MS: u64 = 5000;
const MAX_CONNECTIONS: u32 = 10;

fn connect_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
}

async fn open_pool(db_path: &Path, max_connections: u32) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options(db_path))
        .await?;
    Ok(pool)
}

/// Open the database at `db_path`, creating it if needed. No schema work.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    open_pool(db_path, MAX_CONNECTIONS).await
}

/// Evolve and create tables, then return the serving pool. Safe to call on every startup.
pub async fn init_database(db_path: &Path, defaults: &ReportDefaults) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    let setup = open_pool(db_path, 1).await?;
    prepare_schema(&setup, defaults).await?;
    setup.close().await;
    debug!("Schema setup connection closed");

    let pool = open_pool(db_path, MAX_CONNECTIONS).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    Ok(pool)
}

/// Run schema evolution and table creation on an already-open pool.
///
/// Connections the pool opened before this call may keep a stale schema, so
/// callers serving traffic should open a fresh pool afterwards.
pub async fn prepare_schema(pool: &SqlitePool, defaults: &ReportDefaults) -> Result<()> {
    ensure_schema(pool, defaults).await?;
    UldRepository::new(pool.clone()).init().await?;
    Ok(())
}
