//! Error types for askdb.
//!
//! Every pipeline stage reports failures through [`AskError`]. The variants map
//! one-to-one onto the stages that can fail so the shell can show a single
//! human-readable message per question.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AskError {
    #[error("{message}")]
    EmptyInput { message: String },

    #[error("{provider} request failed: {message}")]
    Service { provider: String, message: String },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AskError {
    /// Create an empty input error.
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Create an LLM service error.
    pub fn service(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// The SQLSTATE code reported by the driver, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors to AskError.
impl From<sqlx::Error> for AskError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AskError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AskError::database(
                    db_err.message(),
                    code,
                    "Check the generated SQL against the schema",
                )
            }
            sqlx::Error::RowNotFound => AskError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => AskError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                AskError::connection("Connection pool is closed", "Restart the session")
            }
            sqlx::Error::Io(io_err) => AskError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => AskError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => AskError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => AskError::database(
                format!("Column not found: {}", col),
                None,
                "Check the generated SQL against the schema",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                AskError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => AskError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => AskError::internal("Database worker crashed"),
            _ => AskError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias used across askdb.
pub type AskResult<T> = Result<T, AskError>;
