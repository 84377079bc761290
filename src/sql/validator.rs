//! Parser-based read-only check.
//!
//! The default sanitizer only checks that the statement starts with `select`.
//! With strict mode enabled, the cleaned statement is additionally parsed with
//! [sqlparser](https://docs.rs/sqlparser/) in the backend's dialect and must be
//! exactly one plain query: no second statement hiding after a semicolon, no
//! `SELECT ... INTO` that creates a table.

use crate::error::{AskError, AskResult};
use crate::models::DatabaseType;
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

mod error_messages {
    pub const PARSE_ERROR: &str = "Failed to parse SQL statement.";
    pub const MULTIPLE_STATEMENTS: &str = "Only a single SELECT statement is allowed.";
    pub const NOT_A_QUERY: &str = "Only SELECT queries are allowed.";
    pub const SELECT_INTO: &str = "SELECT ... INTO creates a table and is not allowed.";
}

/// Get the appropriate SQL dialect for the given database type.
fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Validate that `sql` is a single read-only query.
///
/// # Examples
///
/// ```
/// use askdb::sql::validator::validate_readonly;
/// use askdb::models::DatabaseType;
///
/// assert!(validate_readonly("SELECT * FROM users", DatabaseType::PostgreSQL).is_ok());
/// assert!(validate_readonly("SELECT 1; DROP TABLE users", DatabaseType::PostgreSQL).is_err());
/// ```
pub fn validate_readonly(sql: &str, db_type: DatabaseType) -> AskResult<()> {
    let dialect = get_dialect(db_type);

    let statements = Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| {
        AskError::invalid_query(format!("{} Error: {}", error_messages::PARSE_ERROR, e))
    })?;

    match statements.as_slice() {
        [] => Err(AskError::invalid_query("Empty SQL statement")),
        [statement] => validate_statement(statement),
        _ => Err(AskError::invalid_query(error_messages::MULTIPLE_STATEMENTS)),
    }
}

fn validate_statement(stmt: &Statement) -> AskResult<()> {
    let Statement::Query(query) = stmt else {
        return Err(AskError::invalid_query(format!(
            "{} Found: {}",
            error_messages::NOT_A_QUERY,
            operation_name(stmt)
        )));
    };

    if let SetExpr::Select(select) = query.body.as_ref() {
        if select.into.is_some() {
            return Err(AskError::invalid_query(error_messages::SELECT_INTO));
        }
    }

    Ok(())
}

/// Leading keyword of a statement, used in error messages.
fn operation_name(stmt: &Statement) -> String {
    stmt.to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DB_TYPE: DatabaseType = DatabaseType::PostgreSQL;

    #[test]
    fn test_select_ok() {
        assert!(validate_readonly("SELECT * FROM users", TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_complex_select_with_subquery() {
        let sql = "SELECT u.name, (SELECT COUNT(*) FROM orders WHERE user_id = u.id) AS order_count \
                   FROM users u WHERE u.id IN (SELECT user_id FROM active_users) LIMIT 10";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_select_with_union() {
        let sql = "SELECT a FROM t1 UNION ALL SELECT b FROM t2";
        assert!(validate_readonly(sql, TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_multiple_statements_blocked() {
        let err = validate_readonly("SELECT 1; DELETE FROM users", TEST_DB_TYPE).unwrap_err();
        assert!(matches!(err, AskError::InvalidQuery { .. }));
        assert!(err.to_string().contains("single"));
    }

    #[test]
    fn test_insert_blocked_with_operation_name() {
        let err = validate_readonly("INSERT INTO users VALUES (1)", TEST_DB_TYPE).unwrap_err();
        assert!(err.to_string().contains("INSERT"), "{}", err);
    }

    #[test]
    fn test_select_into_blocked() {
        let result = validate_readonly("SELECT * INTO backup FROM users", TEST_DB_TYPE);
        assert!(result.is_err());
    }

    #[test]
    fn test_unparseable_sql_rejected() {
        let err = validate_readonly("SELECT * FROM (", TEST_DB_TYPE).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_dialects() {
        assert!(validate_readonly("SELECT `id` FROM `users` LIMIT 5", DatabaseType::MySQL).is_ok());
        assert!(validate_readonly("SELECT \"id\" FROM users LIMIT 5", DatabaseType::SQLite).is_ok());
    }
}
