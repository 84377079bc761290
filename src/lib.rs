//! askdb Library
//!
//! Natural-language questions over a SQL database (PostgreSQL, MySQL,
//! SQLite): the schema is described to an LLM, the SQL it writes is cleaned
//! and checked, then executed read-only.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod session;
pub mod shell;
pub mod sql;

pub use config::Config;
pub use error::{AskError, AskResult};
pub use session::{Session, SessionOptions};
