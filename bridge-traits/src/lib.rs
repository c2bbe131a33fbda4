//! # Host Bridge Traits
//!
//! Platform abstraction traits that the artist metadata core depends on but
//! that each host implements differently.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP used by the lookup adapters
//! - [`RecordStore`](storage::RecordStore) - Durable key/value store backing the artist cache
//! - [`SettingsStore`](storage::SettingsStore) - User preferences (e.g. "persist artist data")
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform-specific failures into it and include enough context
//! (URL, table, key) to be actionable in logs.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so a single implementation can be shared
//! across the resolver's spawned tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use storage::{RecordStore, SettingsStore};
