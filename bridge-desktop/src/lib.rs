//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `RecordStore` using a SQLite table with NULL tombstones
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{default_database_path, ReqwestHttpClient, SqliteRecordStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let records = SqliteRecordStore::new(default_database_path(), "artist_records")
//!         .await
//!         .unwrap();
//! }
//! ```

mod http;
mod records;
mod settings;
mod sqlite;

pub use http::ReqwestHttpClient;
pub use records::{SqliteRecordStore, DEFAULT_RECORD_TABLE};
pub use settings::SqliteSettingsStore;

use std::path::PathBuf;

/// Per-user database location for desktop hosts
///
/// Falls back to the working directory when the platform has no data dir.
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("artist-metadata")
        .join("artists.db")
}
