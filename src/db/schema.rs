//! Schema catalog.
//!
//! Reads column names from the database's metadata and caches them per
//! (schema, table) for the lifetime of the catalog, then flattens the result
//! into the text block the prompt embeds.
//!
//! # Architecture
//!
//! SQL queries live in the `queries` submodule with constants for each
//! database type. The backend submodules (postgres, mysql, sqlite) each
//! provide the same `fetch_columns` / `list_tables` interface.

use crate::db::pool::DbPool;
use crate::error::AskResult;
use crate::models::SchemaInfo;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Caching front for schema introspection.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    /// Keyed by (schema name, table name)
    cache: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names of `schema_name.table_name` in ordinal order.
    ///
    /// A missing table and a table without columns both yield an empty list.
    /// The first lookup of a (schema, table) pair queries the database; later
    /// lookups are answered from the cache.
    pub async fn get_table_schema(
        &self,
        pool: &DbPool,
        table_name: &str,
        schema_name: &str,
    ) -> AskResult<Vec<String>> {
        let key = (schema_name.to_string(), table_name.to_string());

        if let Some(columns) = self.cache.read().await.get(&key) {
            debug!(schema = schema_name, table = table_name, "Schema cache hit");
            return Ok(columns.clone());
        }

        let columns = match pool {
            DbPool::Postgres(p) => postgres::fetch_columns(p, table_name, schema_name).await?,
            DbPool::MySql(p) => mysql::fetch_columns(p, table_name, schema_name).await?,
            DbPool::SQLite(p) => sqlite::fetch_columns(p, table_name, schema_name).await?,
        };

        debug!(
            schema = schema_name,
            table = table_name,
            count = columns.len(),
            "Fetched table columns"
        );

        let mut cache = self.cache.write().await;
        Ok(cache.entry(key).or_insert(columns).clone())
    }

    /// Build the schema snapshot for `tables`, keeping the caller's order.
    pub async fn build_schema_info(
        &self,
        pool: &DbPool,
        tables: &[String],
        schema_name: &str,
    ) -> AskResult<SchemaInfo> {
        let mut schema = SchemaInfo::new();
        for table in tables {
            let columns = self.get_table_schema(pool, table, schema_name).await?;
            if columns.is_empty() {
                tracing::warn!(
                    schema = schema_name,
                    table = %table,
                    "Table has no columns or does not exist"
                );
            }
            schema.insert(table.clone(), columns);
        }

        info!(
            schema = schema_name,
            tables = schema.len(),
            "Schema catalog loaded"
        );
        Ok(schema)
    }

    /// Names of the base tables in `schema_name`, sorted by name.
    pub async fn list_tables(&self, pool: &DbPool, schema_name: &str) -> AskResult<Vec<String>> {
        let tables = match pool {
            DbPool::Postgres(p) => postgres::list_tables(p, schema_name).await?,
            DbPool::MySql(p) => mysql::list_tables(p, schema_name).await?,
            DbPool::SQLite(p) => sqlite::list_tables(p, schema_name).await?,
        };
        debug!(schema = schema_name, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Number of cached (schema, table) entries.
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }
}

/// Flatten a schema snapshot into `Table(col1, col2, ...)` lines.
pub fn build_schema_text(schema: &SchemaInfo) -> String {
    schema
        .iter()
        .map(|table| format!("{}({})", table.table_name, table.columns.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const COLUMNS: &str = r#"
            SELECT column_name::text AS column_name
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#;

        pub const TABLES: &str = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;
    }

    pub mod mysql {
        pub const COLUMNS: &str = r#"
            SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#;

        pub const TABLES: &str = r#"
            SELECT CAST(TABLE_NAME AS CHAR) AS table_name
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;
    }

    pub mod sqlite {
        pub const COLUMNS: &str = "SELECT name FROM pragma_table_info(?1, ?2) ORDER BY cid";

        /// `pragma_table_list` needs SQLite 3.37+ (the bundled libsqlite3 is newer).
        pub const TABLES: &str = r#"
            SELECT name FROM pragma_table_list
            WHERE schema = ?1 AND type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn fetch_columns(
        pool: &PgPool,
        table_name: &str,
        schema_name: &str,
    ) -> AskResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::COLUMNS)
            .bind(schema_name)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("column_name")).collect())
    }

    pub async fn list_tables(pool: &PgPool, schema_name: &str) -> AskResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::TABLES)
            .bind(schema_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("table_name")).collect())
    }
}

mod mysql {
    use super::*;
    use sqlx::{MySqlPool, Row};

    pub async fn fetch_columns(
        pool: &MySqlPool,
        table_name: &str,
        schema_name: &str,
    ) -> AskResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::COLUMNS)
            .bind(schema_name)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("column_name")).collect())
    }

    pub async fn list_tables(pool: &MySqlPool, schema_name: &str) -> AskResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::TABLES)
            .bind(schema_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("table_name")).collect())
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn fetch_columns(
        pool: &SqlitePool,
        table_name: &str,
        schema_name: &str,
    ) -> AskResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::COLUMNS)
            .bind(table_name)
            .bind(schema_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    pub async fn list_tables(pool: &SqlitePool, schema_name: &str) -> AskResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::TABLES)
            .bind(schema_name)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }
}
