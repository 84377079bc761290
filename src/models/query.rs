//! Query-related data models.
//!
//! This module defines the SQL types flowing through the pipeline and the
//! tabular result handed to the shell.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::SchemaWarning;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// A SQL statement that passed the sanitizer.
///
/// Only [`crate::sql::sanitizer`] constructs this type, so holding one means
/// the text starts with `select` (case-insensitive), carries no code fences,
/// no trailing semicolon and no repeated whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CleanedSql(String);

impl CleanedSql {
    pub(crate) fn new_unchecked(sql: String) -> Self {
        Self(sql)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for CleanedSql {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CleanedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitizer output: the statement plus advisory schema warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub sql: CleanedSql,
    pub warnings: Vec<SchemaWarning>,
}

/// Rows and columns returned by one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in the order the database reported them
    pub columns: Vec<String>,
    /// One value per column, aligned with `columns`. Names may repeat
    /// (`SELECT f.Key, p.Key ...`), so rows are positional.
    pub rows: Vec<Vec<JsonValue>>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<JsonValue>>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms,
        }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of the first column named `column` in row `index`.
    pub fn value(&self, index: usize, column: &str) -> Option<&JsonValue> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.value_at(index, position)
    }

    /// Value at row `index`, column position `column`.
    pub fn value_at(&self, index: usize, column: usize) -> Option<&JsonValue> {
        self.rows.get(index).and_then(|row| row.get(column))
    }
}

/// Everything one successful question produced.
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    /// LLM output before sanitization
    pub generated_sql: String,
    pub cleaned_sql: CleanedSql,
    pub warnings: Vec<SchemaWarning>,
    pub result: QueryResult,
}
