//! Shared fixtures for integration tests.

#![allow(dead_code)]

use askdb::AskResult;
use askdb::db::DbPool;
use askdb::llm::LlmClient;
use askdb::models::ConnectionConfig;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// LLM stand-in that returns a fixed reply and counts calls.
pub struct MockLlm {
    reply: String,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, prompt: &str) -> AskResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

const SEED: &[&str] = &[
    "CREATE TABLE FactInternetSales (ProductKey INTEGER, SalesAmount REAL, OrderDateKey INTEGER)",
    "CREATE TABLE DimDate (DateKey INTEGER PRIMARY KEY, CalendarYear INTEGER)",
    "CREATE TABLE DimProduct (ProductKey INTEGER PRIMARY KEY, EnglishProductName TEXT)",
    "INSERT INTO DimDate VALUES (20120101, 2012), (20130105, 2013)",
    "INSERT INTO DimProduct VALUES (1, 'Road Bike'), (2, 'Helmet'), (3, 'Mountain Bike')",
    "INSERT INTO FactInternetSales VALUES (1, 1500.0, 20130105), (2, 500.0, 20130105), (3, 2500.0, 20120101)",
];

/// A sales database in a temp directory. Keep the `TempDir` alive while the
/// URL is in use.
pub async fn sales_database() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("sales.db").display());

    let pool = writable_pool(&url).await;
    if let DbPool::SQLite(p) = &pool {
        for statement in SEED {
            sqlx::query(statement).execute(p).await.unwrap();
        }
    }
    pool.close().await;

    (dir, url)
}

/// A writable pool, creating the file if needed.
pub async fn writable_pool(url: &str) -> DbPool {
    let config = ConnectionConfig::new(url).unwrap().with_read_only(false);
    DbPool::connect(&config).await.unwrap()
}

/// The read-only pool a session would use.
pub async fn read_only_pool(url: &str) -> DbPool {
    let config = ConnectionConfig::new(url).unwrap();
    DbPool::connect(&config).await.unwrap()
}

pub fn sales_tables() -> Vec<String> {
    vec!["FactInternetSales".to_string(), "DimDate".to_string()]
}
