//! Result rendering for the shell.

use crate::models::QueryResult;
use clap::ValueEnum;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (like MySQL CLI)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// JSON document with columns and rows
    Json,
}

/// Render `result` in the requested format.
pub fn format_result(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_as_table(result),
        OutputFormat::Markdown => format_as_markdown(result),
        OutputFormat::Json => format_as_json(result),
    }
}

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}

enum Align {
    Left,
    Right,
    Center,
}

/// Pad by display width; `format!` padding counts chars, which misaligns CJK text.
fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(text.width());
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(fill)),
        Align::Right => format!("{}{}", " ".repeat(fill), text),
        Align::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
        }
    }
}

pub fn format_as_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "Empty set".to_string();
    }

    let cells: Vec<Vec<(String, bool)>> = result
        .rows
        .iter()
        .map(|row| {
            (0..result.columns.len())
                .map(|i| {
                    let value = row.get(i).unwrap_or(&JsonValue::Null);
                    (format_value(value), value.is_number())
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.width()).collect();
    for row in &cells {
        for (i, (text, _)) in row.iter().enumerate() {
            widths[i] = widths[i].max(text.width());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    let mut output = separator.clone();
    let header: String = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(col, &w)| format!("| {} ", pad(col, w, Align::Center)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in &cells {
        let line: String = row
            .iter()
            .zip(&widths)
            .map(|((text, numeric), &w)| {
                let align = if *numeric { Align::Right } else { Align::Left };
                format!("| {} ", pad(text, w, align))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&line);
    }
    output.push_str(&separator);

    let row_count = result.row_count();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        row_count,
        row_text,
        result.execution_time_ms as f64 / 1000.0
    ));

    output
}

pub fn format_as_markdown(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = result
        .columns
        .iter()
        .map(|c| format!("| {} ", escape_markdown(c)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = result.columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in &result.rows {
        let line: String = (0..result.columns.len())
            .map(|i| {
                let value = row.get(i).unwrap_or(&JsonValue::Null);
                format!("| {} ", escape_markdown(&format_value(value)))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&line);
    }

    output.push_str(&format!("\n*{} rows*", result.row_count()));

    output
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Column list plus rows as arrays aligned with it, so repeated column
/// names survive.
pub fn format_as_json(result: &QueryResult) -> String {
    let document = serde_json::json!({
        "columns": result.columns,
        "rows": result.rows,
        "row_count": result.row_count(),
        "execution_time_ms": result.execution_time_ms,
    });
    serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QueryResult {
        let rows = vec![
            vec![json!("Road Bike"), json!(1200.5)],
            vec![json!("自転車"), json!(null)],
        ];
        QueryResult::new(vec!["name".into(), "sales".into()], rows, 1500)
    }

    #[test]
    fn test_table_layout() {
        let table = format_as_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+-----------+--------+");
        assert_eq!(lines[1], "|   name    | sales  |");
        assert_eq!(lines[3], "| Road Bike | 1200.5 |");
        assert_eq!(lines[4], "| 自転車    | NULL   |");
        assert_eq!(lines[6], "2 rows in set (1.50 sec)");
    }

    #[test]
    fn test_table_without_columns() {
        let empty = QueryResult::new(vec![], vec![], 0);
        assert_eq!(format_as_table(&empty), "Empty set");
        assert_eq!(format_as_markdown(&empty), "*Empty set*");
    }

    #[test]
    fn test_table_with_columns_but_no_rows() {
        let result = QueryResult::new(vec!["id".into()], vec![], 0);
        let table = format_as_table(&result);
        assert!(table.contains("| id |"));
        assert!(table.ends_with("0 rows in set (0.00 sec)\n"));
    }

    #[test]
    fn test_markdown() {
        let md = format_as_markdown(&sample());
        assert!(md.starts_with("| name | sales |\n|---|---|\n"));
        assert!(md.contains("| Road Bike | 1200.5 |"));
        assert!(md.ends_with("*2 rows*"));
    }

    #[test]
    fn test_json_keeps_column_order() {
        let result = QueryResult::new(vec!["z".into(), "a".into()], vec![vec![json!(2), json!(1)]], 7);
        let parsed: JsonValue = serde_json::from_str(&format_as_json(&result)).unwrap();
        assert_eq!(parsed["columns"], json!(["z", "a"]));
        assert_eq!(parsed["rows"], json!([[2, 1]]));
        assert_eq!(parsed["row_count"], 1);
    }

    #[test]
    fn test_repeated_column_names_render_each_value() {
        let result = QueryResult::new(
            vec!["ProductKey".into(), "ProductKey".into()],
            vec![vec![json!(1), json!(2)]],
            0,
        );
        let table = format_as_table(&result);
        assert!(table.contains("|          1 |          2 |"), "{}", table);
        assert!(format_as_markdown(&result).contains("| 1 | 2 |"));
    }
}
