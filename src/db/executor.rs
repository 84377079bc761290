//! Query execution.
//!
//! Runs a sanitized SELECT against the session pool and materializes every
//! row. No row limit is applied here: the statement's own LIMIT, if any, is
//! the only bound. Each execution is wrapped in the configured timeout.

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{AskError, AskResult};
use crate::models::{CleanedSql, DEFAULT_QUERY_TIMEOUT_SECS, QueryResult};
use futures_util::TryStreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    timeout: Duration,
    decode_binary: bool,
}

impl QueryExecutor {
    /// Create a new query executor with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            decode_binary: true,
        }
    }

    /// Create a new query executor with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            ..Self::new()
        }
    }

    /// Show binary values that are valid UTF-8 as text (`true`, the default)
    /// or always base64-encode them (`false`).
    pub fn with_decode_binary(mut self, decode_binary: bool) -> Self {
        self.decode_binary = decode_binary;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a sanitized SELECT and return all of its rows.
    pub async fn execute(&self, pool: &DbPool, sql: &CleanedSql) -> AskResult<QueryResult> {
        let start = Instant::now();
        let sql = sql.as_str();

        debug!(
            sql = %sql,
            timeout_secs = self.timeout.as_secs(),
            "Executing query"
        );

        let result = match pool {
            DbPool::MySql(p) => {
                let rows = mysql::fetch_rows(p, sql, self.timeout).await?;
                let columns = match rows.first() {
                    Some(row) => row.column_names(),
                    None => mysql::describe_columns(p, sql, self.timeout).await?,
                };
                build_result(columns, rows, start, self.decode_binary)
            }
            DbPool::Postgres(p) => {
                let rows = postgres::fetch_rows(p, sql, self.timeout).await?;
                let columns = match rows.first() {
                    Some(row) => row.column_names(),
                    None => postgres::describe_columns(p, sql, self.timeout).await?,
                };
                build_result(columns, rows, start, self.decode_binary)
            }
            DbPool::SQLite(p) => {
                let rows = sqlite::fetch_rows(p, sql, self.timeout).await?;
                let columns = match rows.first() {
                    Some(row) => row.column_names(),
                    None => sqlite::describe_columns(p, sql, self.timeout).await?,
                };
                build_result(columns, rows, start, self.decode_binary)
            }
        };

        info!(
            rows = result.row_count(),
            columns = result.columns.len(),
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );
        Ok(result)
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn build_result<R: RowToJson>(
    columns: Vec<String>,
    rows: Vec<R>,
    start: Instant,
    decode_binary: bool,
) -> QueryResult {
    let json_rows = rows.iter().map(|r| r.to_json_row(decode_binary)).collect();
    QueryResult::new(columns, json_rows, start.elapsed().as_millis() as u64)
}

fn timeout_error(operation: &str, timeout: Duration) -> AskError {
    AskError::timeout(operation, timeout.as_secs())
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// Statements run as raw SQL: there are no bind parameters, so every backend
// takes its simple/text query path.

/// Generates `fetch_rows` and `describe_columns` for one backend.
macro_rules! backend_executor {
    ($name:ident, $pool:ty, $row:ty) => {
        mod $name {
            use super::*;
            use sqlx::{Column, Executor};

            pub async fn fetch_rows(
                pool: &$pool,
                sql: &str,
                query_timeout: Duration,
            ) -> AskResult<Vec<$row>> {
                let rows_future = pool.fetch(sql).try_collect::<Vec<_>>();
                match timeout(query_timeout, rows_future).await {
                    Ok(rows) => rows.map_err(AskError::from),
                    Err(_) => Err(timeout_error("query execution", query_timeout)),
                }
            }

            /// Column names of a statement that returned no rows.
            ///
            /// A describe failure leaves the columns empty; running out of
            /// time is a timeout like any other query step.
            pub async fn describe_columns(
                pool: &$pool,
                sql: &str,
                query_timeout: Duration,
            ) -> AskResult<Vec<String>> {
                match timeout(query_timeout, pool.describe(sql)).await {
                    Ok(Ok(describe)) => Ok(describe
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect()),
                    Ok(Err(e)) => {
                        warn!(error = %e, "Could not describe empty result set");
                        Ok(Vec::new())
                    }
                    Err(_) => Err(timeout_error("describing the result set", query_timeout)),
                }
            }
        }
    };
}

backend_executor!(mysql, sqlx::MySqlPool, sqlx::mysql::MySqlRow);
backend_executor!(postgres, sqlx::PgPool, sqlx::postgres::PgRow);
backend_executor!(sqlite, sqlx::SqlitePool, sqlx::sqlite::SqliteRow);
