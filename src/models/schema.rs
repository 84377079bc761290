//! Schema-related data models.
//!
//! [`SchemaInfo`] is the session's snapshot of the known tables and their
//! columns. It keeps tables in the order they were added, which is the order
//! the caller asked for, and columns in the order the database reported them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns of a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    pub table_name: String,
    pub columns: Vec<String>,
}

impl TableColumns {
    pub fn new(table_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }
}

/// Ordered mapping from table name to column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    tables: Vec<TableColumns>,
}

impl SchemaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing the columns of an existing entry with the same name.
    ///
    /// A replaced table keeps its original position.
    pub fn insert(&mut self, table_name: impl Into<String>, columns: Vec<String>) {
        let table_name = table_name.into();
        match self.tables.iter_mut().find(|t| t.table_name == table_name) {
            Some(existing) => existing.columns = columns,
            None => self.tables.push(TableColumns::new(table_name, columns)),
        }
    }

    /// Builder form of [`SchemaInfo::insert`].
    pub fn with_table<S: Into<String>>(
        mut self,
        table_name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.insert(table_name, columns.into_iter().map(Into::into).collect());
        self
    }

    /// Columns of `table_name`, if the table is known.
    pub fn columns(&self, table_name: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|t| t.table_name == table_name)
            .map(|t| t.columns.as_slice())
    }

    /// Table names in insertion order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table_name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableColumns> {
        self.tables.iter()
    }

    /// Union of every known column name across all tables.
    pub fn all_columns(&self) -> HashSet<&str> {
        self.tables
            .iter()
            .flat_map(|t| t.columns.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Advisory finding from the sanitizer's schema scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaWarning {
    /// The column suffix that matched no known column.
    pub column: String,
    /// The dotted token the column was taken from, e.g. `p.Colour`.
    pub token: String,
}

impl SchemaWarning {
    pub fn unknown_column(column: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Column not in schema: {}", self.column)
    }
}
