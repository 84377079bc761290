//! The question-answering session.
//!
//! A [`Session`] is created once per process: it opens the connection, loads
//! the schema snapshot that every prompt embeds, and holds the LLM client.
//! Each question then flows through the stages in order:
//!
//! 1. [`validate_question`] rejects blank input before anything else runs
//! 2. [`Session::generate_sql`] prompts the model
//! 3. [`Session::clean_sql`] sanitizes the reply against the schema
//! 4. [`Session::execute`] runs the cleaned statement
//!
//! [`Session::ask`] runs all four; the shell calls them one at a time so it
//! can print each artifact as soon as it exists.

use crate::config::Config;
use crate::db::{DbPool, QueryExecutor, SchemaCatalog, build_schema_text};
use crate::error::{AskError, AskResult};
use crate::llm::{self, LlmClient};
use crate::models::{
    Answer, CleanedSql, DEFAULT_QUERY_TIMEOUT_SECS, DatabaseType, QueryResult, Sanitized,
    SchemaInfo,
};
use crate::sql::{SanitizeOptions, build_prompt, sanitize_with};
use std::sync::Arc;
use tracing::{debug, info};

const EMPTY_QUESTION: &str = "Please enter a question.";

/// Reject blank questions.
pub fn validate_question(question: &str) -> AskResult<()> {
    if question.trim().is_empty() {
        return Err(AskError::empty_input(EMPTY_QUESTION));
    }
    Ok(())
}

/// How a session loads its schema and checks generated SQL.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Schema to introspect; the backend default when `None`
    pub schema: Option<String>,
    /// Tables to describe to the model; every base table when empty
    pub tables: Vec<String>,
    pub sanitize: SanitizeOptions,
    pub query_timeout_secs: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            schema: None,
            tables: Vec::new(),
            sanitize: SanitizeOptions::default(),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

pub struct Session {
    pool: DbPool,
    llm: Arc<dyn LlmClient>,
    catalog: SchemaCatalog,
    executor: QueryExecutor,
    sanitize_options: SanitizeOptions,
    schema_name: String,
    schema: SchemaInfo,
    schema_text: String,
}

impl Session {
    /// Open the configured database and LLM client and load the schema.
    pub async fn connect(config: &Config) -> AskResult<Self> {
        let conn_config = config.connection_config()?;
        // Fail on a missing API key before touching the database
        let llm = llm::build_client(&config.llm_settings()?)?;
        let pool = DbPool::connect(&conn_config).await?;

        let options = SessionOptions {
            schema: config.schema.clone(),
            tables: config.table_list(),
            sanitize: config.sanitize_options(conn_config.db_type),
            query_timeout_secs: config.query_timeout,
        };

        match Self::new(pool.clone(), llm, options).await {
            Ok(session) => Ok(session),
            Err(e) => {
                pool.close().await;
                Err(e)
            }
        }
    }

    /// Build a session over an open pool.
    pub async fn new(
        pool: DbPool,
        llm: Arc<dyn LlmClient>,
        options: SessionOptions,
    ) -> AskResult<Self> {
        let schema_name = match options.schema {
            Some(schema) => schema,
            None => pool.default_schema().await?,
        };

        let catalog = SchemaCatalog::new();
        let tables = if options.tables.is_empty() {
            let discovered = catalog.list_tables(&pool, &schema_name).await?;
            if discovered.is_empty() {
                return Err(AskError::config(format!(
                    "No tables found in schema '{}'. Pass --tables or --schema",
                    schema_name
                )));
            }
            discovered
        } else {
            options.tables
        };

        let schema = catalog.build_schema_info(&pool, &tables, &schema_name).await?;
        let schema_text = build_schema_text(&schema);

        info!(
            db_type = %pool.db_type(),
            schema = %schema_name,
            tables = schema.len(),
            llm = llm.name(),
            "Session ready"
        );

        Ok(Self {
            pool,
            llm,
            catalog,
            executor: QueryExecutor::with_timeout(options.query_timeout_secs),
            sanitize_options: options.sanitize,
            schema_name,
            schema,
            schema_text,
        })
    }

    /// Ask the model for SQL answering `question`.
    pub async fn generate_sql(&self, question: &str) -> AskResult<String> {
        validate_question(question)?;
        let prompt = build_prompt(question, &self.schema_text, self.db_type());
        debug!(prompt_len = prompt.len(), "Built prompt");
        llm::generate_sql(self.llm.as_ref(), &prompt).await
    }

    /// Sanitize model output against the session schema.
    pub fn clean_sql(&self, raw_sql: &str) -> AskResult<Sanitized> {
        sanitize_with(raw_sql, &self.schema, self.sanitize_options)
    }

    pub async fn execute(&self, sql: &CleanedSql) -> AskResult<QueryResult> {
        self.executor.execute(&self.pool, sql).await
    }

    /// Run every stage for one question. The first failure stops the rest.
    pub async fn ask(&self, question: &str) -> AskResult<Answer> {
        let generated_sql = self.generate_sql(question).await?;
        let Sanitized { sql, warnings } = self.clean_sql(&generated_sql)?;
        let result = self.execute(&sql).await?;

        Ok(Answer {
            question: question.to_string(),
            generated_sql,
            cleaned_sql: sql,
            warnings,
            result,
        })
    }

    /// Release the database connection.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!(cached_tables = self.catalog.cached_len().await, "Session closed");
    }

    pub fn db_type(&self) -> DatabaseType {
        self.pool.db_type()
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn schema(&self) -> &SchemaInfo {
        &self.schema
    }

    /// The schema description embedded in every prompt.
    pub fn schema_text(&self) -> &str {
        &self.schema_text
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
