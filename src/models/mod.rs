//! Data models for askdb.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, DatabaseType};
pub use query::{Answer, CleanedSql, DEFAULT_QUERY_TIMEOUT_SECS, QueryResult, Sanitized};
pub use schema::{SchemaInfo, SchemaWarning, TableColumns};
