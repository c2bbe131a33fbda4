//! Durable record storage using SQLite
//!
//! Each store owns one table. A NULL `value` column is a tombstone, which keeps
//! "looked up, nothing found" distinct from "never looked up".

use crate::sqlite;
use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::RecordStore,
};
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Default table used for the artist cache
pub const DEFAULT_RECORD_TABLE: &str = "artist_records";

/// SQLite-backed [`RecordStore`]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteRecordStore {
    /// Open a record store in the given database file
    pub async fn new(db_path: PathBuf, table: &str) -> Result<Self> {
        let pool = sqlite::open_file(&db_path).await?;
        let store = Self::with_pool(pool, table).await?;
        debug!(path = ?db_path, table, "Initialized record store");
        Ok(store)
    }

    /// Create an in-memory record store (for testing)
    pub async fn in_memory(table: &str) -> Result<Self> {
        Self::with_pool(sqlite::open_in_memory().await?, table).await
    }

    /// Use an existing pool, creating the table if needed
    pub async fn with_pool(pool: SqlitePool, table: &str) -> Result<Self> {
        Self::validate_table_name(table)?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                key TEXT PRIMARY KEY,
                value TEXT,
                updated_at INTEGER NOT NULL
            )",
            table
        ))
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to create table: {}", e)))?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Table names are interpolated into SQL, so only identifiers are allowed
    fn validate_table_name(table: &str) -> Result<()> {
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            && !table.starts_with(|c: char| c.is_ascii_digit());

        if valid {
            Ok(())
        } else {
            Err(BridgeError::Storage(format!(
                "Invalid record table name: {:?}",
                table
            )))
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get_all(&self) -> Result<HashMap<String, Option<String>>> {
        let rows = sqlx::query(&format!("SELECT key, value FROM {}", self.table))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to load records: {}", e)))?;

        let records: HashMap<String, Option<String>> = rows
            .into_iter()
            .map(|row| (row.get::<String, _>(0), row.get::<Option<String>, _>(1)))
            .collect();

        debug!(table = %self.table, count = records.len(), "Loaded records");
        Ok(records)
    }

    async fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            self.table
        ))
        .bind(key)
        .bind(value)
        .bind(sqlite::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to store record: {}", e)))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE key = ?", self.table))
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to remove record: {}", e)))?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {}", self.table))
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to clear records: {}", e)))?;

        debug!(table = %self.table, "Cleared records");
        Ok(())
    }
}
