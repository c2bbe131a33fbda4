//! # Core Configuration Module
//!
//! Builder-style configuration for the artist metadata core.
//!
//! ## Overview
//!
//! `CoreConfig` holds the bridge implementations the core talks to and the
//! settings for the three lookup services. Bridges are optional here: a host
//! that does not inject one gets the desktop default at bootstrap time (with
//! the `desktop-shims` feature) or a `CapabilityMissing` error.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, MetadataApiConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/artists.db")
//!     .http_client(Arc::new(MyHttpClient))
//!     .metadata_api_config(
//!         MetadataApiConfig::new()
//!             .with_musicbrainz_user_agent("MyPlayer/2.1 (ops@example.com)")
//!             .with_deezer_proxy_url("https://proxy.example.com/deezer"),
//!     )
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Persistence Preference
//!
//! Whether resolved artists are written to durable storage is a user setting,
//! stored in the `SettingsStore` under [`DEFAULT_PERSIST_PREFERENCE_KEY`]
//! unless overridden. It is read on every cache mutation, so flipping it takes
//! effect immediately.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, RecordStore, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Settings key of the "persist artist data" toggle
pub const DEFAULT_PERSIST_PREFERENCE_KEY: &str = "persist_artist_data";

/// Default MusicBrainz user agent
pub const DEFAULT_MUSICBRAINZ_USER_AGENT: &str = concat!(
    "artist-metadata-core/",
    env!("CARGO_PKG_VERSION"),
    " (artist-metadata-core@users.noreply.github.com)"
);

pub const DEFAULT_MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
pub const DEFAULT_AUDIODB_BASE_URL: &str = "https://www.theaudiodb.com/api/v1/json";
/// TheAudioDB's public test key
pub const DEFAULT_AUDIODB_API_KEY: &str = "2";
pub const DEFAULT_DEEZER_BASE_URL: &str = "https://api.deezer.com";

/// Minimum spacing between MusicBrainz calls, in milliseconds
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;
pub const MAX_RATE_LIMIT_DELAY_MS: u64 = 60_000;

/// Configuration for the external lookup services.
///
/// MusicBrainz allows one anonymous request per second per client and
/// requires an identifying user agent of the form `AppName/Version (Contact)`.
/// TheAudioDB and Deezer are keyless for search; the rate gate only spaces
/// MusicBrainz turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataApiConfig {
    /// MusicBrainz user agent string (format: "AppName/Version (Contact)")
    pub musicbrainz_user_agent: String,

    /// MusicBrainz web service root
    pub musicbrainz_base_url: String,

    /// TheAudioDB JSON API root (the key is appended as a path segment)
    pub audiodb_base_url: String,

    /// TheAudioDB API key
    pub audiodb_api_key: String,

    /// Deezer API root used for direct calls
    pub deezer_base_url: String,

    /// Routed base for Deezer when the host cannot reach it directly
    ///
    /// Browser-embedded hosts have no CORS access to Deezer and must go
    /// through a proxy that forwards `{proxy}/search/artist?...` upstream.
    pub deezer_proxy_url: Option<String>,

    /// Minimum delay in milliseconds between primary-source turns
    pub rate_limit_delay_ms: u64,
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataApiConfig {
    pub fn new() -> Self {
        Self {
            musicbrainz_user_agent: DEFAULT_MUSICBRAINZ_USER_AGENT.to_string(),
            musicbrainz_base_url: DEFAULT_MUSICBRAINZ_BASE_URL.to_string(),
            audiodb_base_url: DEFAULT_AUDIODB_BASE_URL.to_string(),
            audiodb_api_key: DEFAULT_AUDIODB_API_KEY.to_string(),
            deezer_base_url: DEFAULT_DEEZER_BASE_URL.to_string(),
            deezer_proxy_url: None,
            rate_limit_delay_ms: DEFAULT_RATE_LIMIT_DELAY_MS,
        }
    }

    pub fn with_musicbrainz_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.musicbrainz_user_agent = user_agent.into();
        self
    }

    pub fn with_musicbrainz_base_url(mut self, url: impl Into<String>) -> Self {
        self.musicbrainz_base_url = url.into();
        self
    }

    pub fn with_audiodb_base_url(mut self, url: impl Into<String>) -> Self {
        self.audiodb_base_url = url.into();
        self
    }

    pub fn with_audiodb_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.audiodb_api_key = api_key.into();
        self
    }

    pub fn with_deezer_base_url(mut self, url: impl Into<String>) -> Self {
        self.deezer_base_url = url.into();
        self
    }

    pub fn with_deezer_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.deezer_proxy_url = Some(url.into());
        self
    }

    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let ua = &self.musicbrainz_user_agent;
        if ua.trim().is_empty() {
            return Err(Error::Config(
                "MusicBrainz user agent cannot be empty".to_string(),
            ));
        }
        if !ua.contains('/') || !ua.contains('(') || !ua.contains(')') {
            return Err(Error::Config(
                "MusicBrainz user agent must follow format: 'AppName/Version (Contact)'"
                    .to_string(),
            ));
        }

        Self::validate_url("MusicBrainz base URL", &self.musicbrainz_base_url)?;
        Self::validate_url("TheAudioDB base URL", &self.audiodb_base_url)?;
        Self::validate_url("Deezer base URL", &self.deezer_base_url)?;
        if let Some(proxy) = &self.deezer_proxy_url {
            Self::validate_url("Deezer proxy URL", proxy)?;
        }

        if self.audiodb_api_key.trim().is_empty() {
            return Err(Error::Config(
                "TheAudioDB API key cannot be empty".to_string(),
            ));
        }

        if self.rate_limit_delay_ms == 0 {
            return Err(Error::Config(
                "Rate limit delay must be greater than 0ms".to_string(),
            ));
        }

        if self.rate_limit_delay_ms > MAX_RATE_LIMIT_DELAY_MS {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_url(what: &str, url: &str) -> Result<()> {
        if url.starts_with("https://") || url.starts_with("http://") {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "{} must be an http(s) URL, got {:?}",
                what, url
            )))
        }
    }
}

/// Core configuration for the artist metadata core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// SQLite file used by the desktop record and settings stores
    pub database_path: Option<PathBuf>,

    /// HTTP client shared by the lookup adapters
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// User preferences (holds the persistence toggle)
    pub settings_store: Option<Arc<dyn SettingsStore>>,

    /// Durable artist cache
    pub record_store: Option<Arc<dyn RecordStore>>,

    /// External lookup service configuration
    pub metadata_api_config: MetadataApiConfig,

    /// Settings key read before every durable mirror
    pub persist_preference_key: String,

    /// Capacity of the event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "settings_store",
                &self.settings_store.as_ref().map(|_| "SettingsStore { ... }"),
            )
            .field(
                "record_store",
                &self.record_store.as_ref().map(|_| "RecordStore { ... }"),
            )
            .field("metadata_api_config", &self.metadata_api_config)
            .field("persist_preference_key", &self.persist_preference_key)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.persist_preference_key.trim().is_empty() {
            return Err(Error::Config(
                "Persist preference key cannot be empty".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.metadata_api_config.validate()
    }

    /// Error for a bridge the host neither injected nor can default
    pub fn capability_missing(capability: &str, purpose: &str) -> Error {
        Error::CapabilityMissing {
            capability: capability.to_string(),
            message: format!(
                "{} implementation is required for {}. \
                 Desktop: enable the 'desktop-shims' feature to use the default. \
                 Other hosts: inject a platform-native implementation.",
                capability, purpose
            ),
        }
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    record_store: Option<Arc<dyn RecordStore>>,
    metadata_api_config: Option<MetadataApiConfig>,
    persist_preference_key: Option<String>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the SQLite file used by the desktop stores.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn metadata_api_config(mut self, config: MetadataApiConfig) -> Self {
        self.metadata_api_config = Some(config);
        self
    }

    pub fn persist_preference_key(mut self, key: impl Into<String>) -> Self {
        self.persist_preference_key = Some(key.into());
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the final `CoreConfig`.
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            database_path: self.database_path,
            http_client: self.http_client,
            settings_store: self.settings_store,
            record_store: self.record_store,
            metadata_api_config: self.metadata_api_config.unwrap_or_default(),
            persist_preference_key: self
                .persist_preference_key
                .unwrap_or_else(|| DEFAULT_PERSIST_PREFERENCE_KEY.to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
