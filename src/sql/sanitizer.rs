//! Cleanup and safety checks for LLM-generated SQL.
//!
//! The model's reply is free text: it may arrive wrapped in markdown fences,
//! carry escaped or real line breaks, end with a semicolon, or not be a query
//! at all. [`sanitize`] turns it into a single-line [`CleanedSql`] or rejects
//! it, and reports dotted column references that match no known column.
//!
//! Validation is string based. The prefix check only looks at the first
//! word, so anything select-shaped passes; [`sanitize_with`] can add a
//! parser-based check on top.

use crate::error::{AskError, AskResult};
use crate::models::{CleanedSql, DatabaseType, Sanitized, SchemaInfo, SchemaWarning};
use crate::sql::validator::validate_readonly;
use std::collections::HashSet;
use tracing::{debug, warn};

const NOT_A_SELECT: &str = "Only SELECT queries are allowed.";

/// Optional checks layered on top of the default sanitizer.
///
/// Both are off by default, which gives exactly the behavior of [`sanitize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Parse the cleaned statement with this dialect's grammar and require a
    /// single read-only query.
    pub parse_check: Option<DatabaseType>,
    /// Fail instead of warning when a dotted reference names an unknown column.
    pub reject_unknown_columns: bool,
}

/// Clean raw model output and check it against the schema.
///
/// # Errors
///
/// Returns [`AskError::InvalidQuery`] if the normalized text does not start
/// with `select` (ASCII case-insensitive).
pub fn sanitize(raw_sql: &str, schema: &SchemaInfo) -> AskResult<Sanitized> {
    sanitize_with(raw_sql, schema, SanitizeOptions::default())
}

/// [`sanitize`] with optional strict checks.
pub fn sanitize_with(
    raw_sql: &str,
    schema: &SchemaInfo,
    options: SanitizeOptions,
) -> AskResult<Sanitized> {
    let normalized = normalize(raw_sql);

    if !starts_with_select(&normalized) {
        debug!(sql = %normalized, "Rejected non-SELECT statement");
        return Err(AskError::invalid_query(NOT_A_SELECT));
    }

    let sql = match normalized.strip_suffix(';') {
        Some(stripped) => stripped.to_string(),
        None => normalized,
    };

    if let Some(dialect) = options.parse_check {
        validate_readonly(&sql, dialect)?;
    }

    let warnings = unknown_columns(&sql, schema);
    for warning in &warnings {
        warn!(column = %warning.column, token = %warning.token, "{}", warning);
    }

    if options.reject_unknown_columns && !warnings.is_empty() {
        // First occurrence order
        let mut seen = HashSet::new();
        let names: Vec<&str> = warnings
            .iter()
            .map(|w| w.column.as_str())
            .filter(|name| seen.insert(*name))
            .collect();
        return Err(AskError::invalid_query(format!(
            "Columns not in schema: {}",
            names.join(", ")
        )));
    }

    Ok(Sanitized {
        sql: CleanedSql::new_unchecked(sql),
        warnings,
    })
}

/// Fence removal, trimming and whitespace collapsing.
fn normalize(raw_sql: &str) -> String {
    let unfenced = raw_sql.replace("```sql", "").replace("```", "");
    let trimmed = unfenced.trim_matches(|c: char| matches!(c, '`' | ' ' | '\n' | '\r' | '\t'));

    // Escaped line breaks first (the two characters `\` `r`), then real ones
    let flattened = trimmed
        .replace("\\r", " ")
        .replace("\\n", " ")
        .replace(['\r', '\n'], " ");

    flattened.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_select(sql: &str) -> bool {
    sql.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}

/// One warning per dotted token whose last segment is not a known column.
fn unknown_columns(sql: &str, schema: &SchemaInfo) -> Vec<SchemaWarning> {
    let known = schema.all_columns();

    sql.replace([',', '(', ')'], " ")
        .split_whitespace()
        .filter(|token| token.contains('.'))
        .filter_map(|token| {
            let column = token.rsplit('.').next().unwrap_or(token);
            (!known.contains(column)).then(|| SchemaWarning::unknown_column(column, token))
        })
        .collect()
}
