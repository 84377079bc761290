//! Database access layer.
//!
//! This module provides:
//! - Connection pool management
//! - Schema introspection with a per-session cache
//! - Query execution
//! - Type mappings from backend values to JSON

pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::DbPool;
pub use schema::{SchemaCatalog, build_schema_text};
pub use types::RowToJson;
