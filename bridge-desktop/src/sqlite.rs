//! Shared SQLite pool helpers for the desktop stores

use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Open (creating if needed) a database file
pub(crate) async fn open_file(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(BridgeError::Io)?;
    }

    // SQLite URLs want forward slashes even on Windows
    let path_str = db_path.to_string_lossy().replace('\\', "/");
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path_str))
        .map_err(|e| BridgeError::Storage(format!("Invalid database path: {}", e)))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))
}

/// Open a private in-memory database
///
/// Every SQLite connection to `:memory:` gets its own database, so the pool is
/// pinned to a single connection.
pub(crate) async fn open_in_memory() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))
}

/// Current Unix timestamp in seconds
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
