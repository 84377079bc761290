//! Tests for the line-oriented shell output.

mod common;

use askdb::shell::{OutputFormat, Shell};
use askdb::{Session, SessionOptions};
use common::{MockLlm, read_only_pool, sales_database, sales_tables};
use std::sync::Arc;

async fn session(url: &str, reply: &str) -> Session {
    let options = SessionOptions {
        tables: sales_tables(),
        ..Default::default()
    };
    Session::new(
        read_only_pool(url).await,
        Arc::new(MockLlm::new(reply)),
        options,
    )
    .await
    .unwrap()
}

async fn answer(session: &Session, format: OutputFormat, question: &str) -> (bool, String) {
    let shell = Shell::new(session, format);
    let mut out = Vec::new();
    let ok = shell.answer(question, &mut out).await.unwrap();
    (ok, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_successful_answer_prints_all_artifacts() {
    let (_dir, url) = sales_database().await;
    let session = session(&url, "```sql\nSELECT CalendarYear FROM DimDate ORDER BY CalendarYear;\n```").await;

    let (ok, output) = answer(&session, OutputFormat::Table, "Which years?").await;

    assert!(ok);
    assert!(output.starts_with("Generated SQL:\nSELECT CalendarYear FROM DimDate ORDER BY CalendarYear;\n```\n\n"));
    assert!(output.contains("Cleaned SQL:\nSELECT CalendarYear FROM DimDate ORDER BY CalendarYear\n\n"));
    assert!(!output.contains("Warning:"));
    assert!(output.contains("| CalendarYear |"));
    assert!(output.contains("|         2012 |"));
    assert!(output.contains("2 rows in set"));

    session.close().await;
}

#[tokio::test]
async fn test_failure_keeps_earlier_artifacts() {
    let (_dir, url) = sales_database().await;
    let session = session(&url, "SELECT d.Year FROM DimDate d").await;

    let (ok, output) = answer(&session, OutputFormat::Table, "Which years?").await;

    assert!(!ok);
    assert!(output.contains("Generated SQL:\nSELECT d.Year FROM DimDate d\n"));
    assert!(output.contains("Cleaned SQL:\nSELECT d.Year FROM DimDate d\n"));
    assert!(output.contains("Warning: Column not in schema: Year\n"));
    assert!(output.contains("Error: Database error:"));

    session.close().await;
}

#[tokio::test]
async fn test_rejected_sql_has_no_cleaned_block() {
    let (_dir, url) = sales_database().await;
    let session = session(&url, "UPDATE DimDate SET CalendarYear = 0").await;

    let (ok, output) = answer(&session, OutputFormat::Table, "Reset years").await;

    assert!(!ok);
    assert!(output.contains("Generated SQL:"));
    assert!(!output.contains("Cleaned SQL:"));
    assert!(output.contains("Error: Invalid query: Only SELECT queries are allowed."));

    session.close().await;
}

#[tokio::test]
async fn test_markdown_and_json_formats() {
    let (_dir, url) = sales_database().await;
    let session = session(&url, "SELECT DateKey FROM DimDate WHERE CalendarYear = 2013").await;

    let (_, markdown) = answer(&session, OutputFormat::Markdown, "2013?").await;
    assert!(markdown.contains("| DateKey |\n|---|\n| 20130105 |\n"));

    let (_, json) = answer(&session, OutputFormat::Json, "2013?").await;
    assert!(json.contains("\"columns\""));
    assert!(json.contains("20130105"));

    session.close().await;
}

#[tokio::test]
async fn test_repl_loop() {
    let (_dir, url) = sales_database().await;
    let session = session(&url, "SELECT COUNT(*) AS n FROM DimDate").await;
    let shell = Shell::new(&session, OutputFormat::Table);

    let input: &[u8] = b"How many dates?\n   \nquit\nNever asked\n";
    let mut out = Vec::new();
    let failures = shell.run(input, &mut out).await.unwrap();
    let output = String::from_utf8(out).unwrap();

    assert_eq!(failures, 1);
    assert!(output.starts_with("askdb> "));
    assert_eq!(output.matches("Generated SQL:").count(), 1);
    assert!(output.contains("Error: Please enter a question."));

    session.close().await;
}

#[tokio::test]
async fn test_repl_ends_on_eof() {
    let (_dir, url) = sales_database().await;
    let session = session(&url, "SELECT 1 AS one").await;
    let shell = Shell::new(&session, OutputFormat::Table);

    let input: &[u8] = b"first\nsecond";
    let mut out = Vec::new();
    let failures = shell.run(input, &mut out).await.unwrap();
    let output = String::from_utf8(out).unwrap();

    assert_eq!(failures, 0);
    assert_eq!(output.matches("Cleaned SQL:\nSELECT 1 AS one").count(), 2);

    session.close().await;
}
