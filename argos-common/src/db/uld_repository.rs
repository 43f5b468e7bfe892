//! ULD status repository
//!
//! Keyed store of ULD records. The business key is `uld_id`; the surrogate
//! `id` is assigned by SQLite and never used for lookups.
//!
//! Upserts are a single `INSERT ... ON CONFLICT(uld_id) DO UPDATE` statement
//! backed by a unique index, so concurrent submissions for the same ULD
//! serialize inside SQLite and can never produce two rows.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::db::table_schemas::ULD_TABLE;
use crate::models::{NormalizedReport, UldRecord};
use crate::{time, Error, Result};

const SELECT_COLUMNS: &str =
    "id, uld_id, status, damage_category, last_seen, location, shipping_location";

/// SQLite-backed ULD repository
#[derive(Debug, Clone)]
pub struct UldRepository {
    pool: SqlitePool,
}

impl UldRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the table and the `uld_id` unique index if missing
    pub async fn init(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uld_id TEXT NOT NULL,
                status TEXT NOT NULL,
                damage_category TEXT,
                last_seen TIMESTAMP NOT NULL,
                location TEXT,
                shipping_location TEXT
            )
            "#,
            ULD_TABLE
        ))
        .execute(&self.pool)
        .await?;

        self.check_no_duplicate_ids().await?;

        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_uld_uld_id ON {} (uld_id)",
            ULD_TABLE
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Legacy tables had no unique constraint; duplicates would make the index fail
    async fn check_no_duplicate_ids(&self) -> Result<()> {
        let duplicates: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT uld_id FROM {} GROUP BY uld_id HAVING COUNT(*) > 1 ORDER BY uld_id",
            ULD_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;

        if duplicates.is_empty() {
            return Ok(());
        }

        let ids = duplicates.join(", ");
        error!(
            "Table '{}' holds several rows for uld_id {}; remove the extra rows before starting",
            ULD_TABLE, ids
        );
        Err(Error::Internal(format!("duplicate uld_id values in {}: {}", ULD_TABLE, ids)))
    }

    /// Insert or update the record for `report.uld_id`.
    ///
    /// On conflict every mutable field is overwritten; the surrogate id is kept.
    pub async fn upsert(&self, report: &NormalizedReport, last_seen: DateTime<Utc>) -> Result<UldRecord> {
        let sql = format!(
            r#"
            INSERT INTO {table} (uld_id, status, damage_category, last_seen, location, shipping_location)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(uld_id) DO UPDATE SET
                status = excluded.status,
                damage_category = excluded.damage_category,
                last_seen = excluded.last_seen,
                location = excluded.location,
                shipping_location = excluded.shipping_location
            RETURNING {columns}
            "#,
            table = ULD_TABLE,
            columns = SELECT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&report.uld_id)
            .bind(report.status.as_str())
            .bind(&report.damage_category)
            .bind(time::to_db_timestamp(&last_seen))
            .bind(&report.location)
            .bind(&report.shipping_location)
            .fetch_one(&self.pool)
            .await?;

        let record = UldRecord::try_from(&row)?;
        debug!(uld_id = %record.uld_id, id = record.id, status = %record.status, "Upserted ULD record");
        Ok(record)
    }

    /// All records, most recently seen first; ties in insertion order
    pub async fn list_all(&self) -> Result<Vec<UldRecord>> {
        // julianday() orders legacy space-separated and RFC 3339 timestamps alike
        let sql = format!(
            "SELECT {} FROM {} ORDER BY julianday(last_seen) DESC, last_seen DESC, id ASC",
            SELECT_COLUMNS, ULD_TABLE
        );

        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(UldRecord::try_from)
            .collect()
    }

    /// Look up a record by its external identifier
    pub async fn find_by_uld_id(&self, uld_id: &str) -> Result<Option<UldRecord>> {
        let sql = format!("SELECT {} FROM {} WHERE uld_id = ?", SELECT_COLUMNS, ULD_TABLE);

        sqlx::query(&sql)
            .bind(uld_id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(UldRecord::try_from)
            .transpose()
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", ULD_TABLE))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
