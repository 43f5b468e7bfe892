//! Database access: initialization, schema evolution and the ULD repository

pub mod init;
pub mod schema_sync;
pub mod seed;
pub mod table_schemas;
pub mod uld_repository;

pub use init::{connect, init_database, prepare_schema};
pub use schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
pub use seed::seed_demo_data;
pub use table_schemas::{ensure_schema, UldTableSchema, ULD_TABLE};
pub use uld_repository::UldRepository;
