//! Table Schema Definitions
//!
//! Single source of truth for the `uld` table's expected columns, plus the
//! startup entry point that evolves an existing table to match.

use crate::config::ReportDefaults;
use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Name of the ULD status table
pub const ULD_TABLE: &str = "uld";

/// ULD table schema
///
/// `location` and `shipping_location` were added after the first release;
/// older databases get them added and backfilled from the report defaults.
pub struct UldTableSchema {
    defaults: ReportDefaults,
}

impl UldTableSchema {
    pub fn new(defaults: ReportDefaults) -> Self {
        Self { defaults }
    }
}

impl TableSchema for UldTableSchema {
    fn table_name(&self) -> &'static str {
        ULD_TABLE
    }

    fn expected_columns(&self) -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("uld_id", "TEXT").not_null(),
            ColumnDefinition::new("status", "TEXT").not_null(),
            ColumnDefinition::new("damage_category", "TEXT"),
            ColumnDefinition::new("last_seen", "TIMESTAMP").not_null(),
            ColumnDefinition::new("location", "TEXT").backfill(self.defaults.origin.clone()),
            ColumnDefinition::new("shipping_location", "TEXT")
                .backfill(self.defaults.fallback_route_label()),
        ]
    }
}

/// Bring an existing `uld` table up to the current additive column set.
///
/// Idempotent. Does nothing when the table has not been created yet.
pub async fn ensure_schema(pool: &SqlitePool, defaults: &ReportDefaults) -> Result<()> {
    info!("=== Schema Synchronization ===");

    SchemaSync::sync_table(pool, &UldTableSchema::new(defaults.clone())).await?;

    info!("=== Schema Synchronization Complete ===");
    Ok(())
}
