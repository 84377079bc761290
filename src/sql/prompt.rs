//! Prompt construction.

use crate::models::DatabaseType;

/// Compose the instruction sent to the LLM.
///
/// Pure interpolation: the same inputs always produce the same prompt.
pub fn build_prompt(question: &str, schema_text: &str, dialect: DatabaseType) -> String {
    format!(
        "\nYou are an expert in {dialect}.
Generate a safe SQL SELECT query for this schema:

Schema:
{schema_text}

Question:
{question}

Rules:
- Only return a SELECT statement.
- Use correct column names from schema.
- If aggregations are needed, use SUM or COUNT properly.
- Always include {limit} if the user asks for limited results.
- Always use ORDER BY if ranking is implied.
- Respond with the SQL statement only, without any explanation.

SQL:\n",
        dialect = dialect.display_name(),
        limit = dialect.row_limit_clause(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "FactInternetSales(ProductKey, SalesAmount)\nDimDate(DateKey, CalendarYear)";

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = build_prompt("Top 5 products by sales", SCHEMA, DatabaseType::PostgreSQL);
        assert!(prompt.contains("You are an expert in PostgreSQL."));
        assert!(prompt.contains(&format!("Schema:\n{}\n", SCHEMA)));
        assert!(prompt.contains("Question:\nTop 5 products by sales\n"));
        assert!(prompt.contains("Always include LIMIT N"));
        assert!(prompt.trim_end().ends_with("SQL:"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt("q", SCHEMA, DatabaseType::SQLite);
        let b = build_prompt("q", SCHEMA, DatabaseType::SQLite);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_does_not_branch_on_question() {
        // A question that looks like SQL is embedded verbatim
        let prompt = build_prompt("DROP TABLE users", SCHEMA, DatabaseType::MySQL);
        assert!(prompt.contains("Question:\nDROP TABLE users\n"));
        assert!(prompt.contains("Only return a SELECT statement."));
        assert!(prompt.contains("expert in MySQL"));
    }
}
