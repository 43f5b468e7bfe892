//! Automatic Schema Synchronization
//!
//! Data-driven, additive-only schema maintenance. Schema definitions in code are
//! compared against `PRAGMA table_info` and missing columns are added with
//! `ALTER TABLE ... ADD COLUMN`. Columns may declare a backfill value that is
//! written into every NULL or blank cell after the column check, so rows that
//! predate a column end up with a usable value.
//!
//! # What this CAN fix
//! - Missing columns (nullable, optional DEFAULT)
//! - NULL / blank values in columns that declare a backfill
//!
//! # What this CANNOT fix (logged, left alone)
//! - Type changes
//! - Constraint changes
//! - Column removal
//!
//! Nothing here drops, renames or rewrites existing data, and every step is
//! safe to repeat.
//!
//! # Usage
//!
//! ```rust,ignore
//! let schema = UldTableSchema::new(defaults);
//! SchemaSync::sync_table(&pool, &schema).await?;
//! ```

use crate::Result;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "TIMESTAMP")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// DEFAULT value (SQL literal)
    pub default_value: Option<String>,
    /// Value written into NULL or blank cells on every sync (bound as a parameter)
    pub backfill: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
            backfill: None,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Fill NULL / blank cells with `value` during sync
    pub fn backfill(mut self, value: impl Into<String>) -> Self {
        self.backfill = Some(value.into());
        self
    }
}

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    /// Column ID (position in table)
    pub cid: i32,
    /// Column name
    pub name: String,
    /// SQL type from PRAGMA table_info
    pub type_name: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// DEFAULT value
    pub default_value: Option<String>,
    /// PRIMARY KEY flag
    pub pk: bool,
}

/// Schema drift detected between expected and actual schema
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    /// Column missing from database
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    /// Type or constraint differs; needs a manual migration
    Unfixable {
        table: String,
        column: String,
        reason: String,
    },
}

/// Defines expected schema for a database table
pub trait TableSchema {
    /// Table name in database
    fn table_name(&self) -> &'static str;

    /// Expected column definitions
    fn expected_columns(&self) -> Vec<ColumnDefinition>;
}

/// Schema introspection via PRAGMA table_info
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read actual columns from database table, in cid order
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut columns = rows
            .iter()
            .map(|row| {
                Ok(ActualColumn {
                    cid: row.try_get("cid")?,
                    name: row.try_get("name")?,
                    type_name: row.try_get("type")?,
                    not_null: row.try_get::<i32, _>("notnull")? != 0,
                    default_value: row.try_get("dflt_value")?,
                    pk: row.try_get::<i32, _>("pk")? != 0,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        columns.sort_by_key(|c| c.cid);

        Ok(columns)
    }

    /// Check if table exists
    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Schema comparison - detect drift between expected and actual
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare expected schema to actual database schema
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn],
    ) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for expected_col in expected {
            let Some(actual_col) = actual
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&expected_col.name))
            else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                });
                continue;
            };

            let mut reasons = Vec::new();
            if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                reasons.push(format!(
                    "type '{}' instead of '{}'",
                    actual_col.type_name, expected_col.sql_type
                ));
            }
            if expected_col.not_null && !actual_col.not_null {
                reasons.push("missing NOT NULL".to_string());
            }
            if expected_col.primary_key && !actual_col.pk {
                reasons.push("missing PRIMARY KEY".to_string());
            }

            if !reasons.is_empty() {
                drift.push(SchemaDrift::Unfixable {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    reason: reasons.join(", "),
                });
            }
        }

        drift
    }

    /// Check if SQL types are compatible (SQLite type affinity rules)
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        let is_int = |t: &str| t.contains("INT");
        let is_text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
        let is_real = |t: &str| t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB");
        // Timestamps are stored as text; older writers declared them DATETIME
        let is_time = |t: &str| t.contains("TIMESTAMP") || t.contains("DATETIME") || t == "DATE";

        (is_int(&exp) && is_int(&act))
            || (is_text(&exp) && is_text(&act))
            || (is_real(&exp) && is_real(&act))
            || (is_time(&exp) && is_time(&act))
    }
}

/// Schema synchronization - apply additive schema changes to database
pub struct SchemaSync;

impl SchemaSync {
    /// Synchronize table schema: add missing columns, then backfill.
    ///
    /// A table that does not exist yet is left alone; creating it is the
    /// owning repository's job.
    pub async fn sync_table<T: TableSchema + ?Sized>(pool: &SqlitePool, schema: &T) -> Result<()> {
        let table_name = schema.table_name();
        let expected = schema.expected_columns();

        info!("Schema sync: Checking table '{}'", table_name);

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            debug!("  Table '{}' does not exist yet, nothing to sync", table_name);
            return Ok(());
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &expected, &actual);

        let mut tx = pool.begin().await?;

        if drift.is_empty() {
            info!("  ✓ Columns up to date for '{}'", table_name);
        }

        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(&mut tx, &table, &column).await?;
                }
                SchemaDrift::Unfixable { table, column, reason } => {
                    warn!("  ⚠ {}.{}: {}. Left as is.", table, column, reason);
                }
            }
        }

        for column in expected.iter().filter(|c| c.backfill.is_some()) {
            Self::backfill_column(&mut tx, table_name, column).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Add missing column to table via ALTER TABLE ADD COLUMN
    async fn add_column(
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<()> {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column.name, column.sql_type
        );

        // ADD COLUMN cannot carry PRIMARY KEY, and NOT NULL only together with a DEFAULT
        match (&column.default_value, column.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, _) if column.primary_key => {
                warn!("  ⚠ {}.{} added without its PRIMARY KEY constraint", table, column.name);
            }
            (None, true) => {
                warn!("  ⚠ {}.{} added nullable (NOT NULL needs a DEFAULT)", table, column.name);
            }
            (None, false) => {}
        }

        info!("  ✓ Adding column: {}.{} ({})", table, column.name, column.sql_type);

        match sqlx::query(&sql).execute(&mut **tx).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                info!("  Column {}.{} already present", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace NULL / blank cells with the column's backfill value
    async fn backfill_column(
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<u64> {
        let Some(value) = &column.backfill else {
            return Ok(0);
        };

        let sql = format!(
            "UPDATE {table} SET {col} = ? WHERE {col} IS NULL OR TRIM({col}) = ''",
            table = table,
            col = column.name
        );
        let updated = sqlx::query(&sql)
            .bind(value)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if updated > 0 {
            info!("  ✓ Backfilled {} row(s) in {}.{}", updated, table, column.name);
        }

        Ok(updated)
    }
}
