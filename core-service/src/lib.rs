//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! durable records) into the artist metadata core. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) so
//! any bridge they do not inject is filled with the SQLite/reqwest default.
//! Other hosts must inject every bridge.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/artists.db")
//!     .build()?;
//! let core = CoreService::bootstrap(config).await?;
//!
//! let report = core.artists().resolve_all(["Radiohead", "Björk"]).await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::path::PathBuf;
use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    storage::{RecordStore, SettingsStore},
};
use core_metadata::ArtistResolver;
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub record_store: Arc<dyn RecordStore>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        settings_store: Arc<dyn SettingsStore>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            http_client,
            settings_store,
            record_store,
        }
    }

    /// Take the injected bridges from `config`, filling gaps with desktop
    /// defaults when available.
    pub async fn from_config(config: &CoreConfig) -> Result<Self> {
        let database_path = Self::database_path(config);

        let http_client = match &config.http_client {
            Some(client) => Arc::clone(client),
            None => default_http_client()?,
        };
        let settings_store = match &config.settings_store {
            Some(store) => Arc::clone(store),
            None => default_settings_store(&database_path).await?,
        };
        let record_store = match &config.record_store {
            Some(store) => Arc::clone(store),
            None => default_record_store(&database_path).await?,
        };

        Ok(Self::new(http_client, settings_store, record_store))
    }

    #[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
    fn database_path(config: &CoreConfig) -> Option<PathBuf> {
        Some(
            config
                .database_path
                .clone()
                .unwrap_or_else(bridge_desktop::default_database_path),
        )
    }

    #[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
    fn database_path(config: &CoreConfig) -> Option<PathBuf> {
        config.database_path.clone()
    }
}

fn missing(capability: &str, purpose: &str) -> CoreError {
    match CoreConfig::capability_missing(capability, purpose) {
        core_runtime::Error::CapabilityMissing {
            capability,
            message,
        } => CoreError::CapabilityMissing {
            capability,
            message,
        },
        other => CoreError::Runtime(other),
    }
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Ok(Arc::new(bridge_desktop::ReqwestHttpClient::new()))
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(missing("HttpClient", "artist lookups"))
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
async fn default_settings_store(path: &Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    let path = path
        .clone()
        .ok_or_else(|| missing("SettingsStore", "the persistence preference"))?;
    let store = bridge_desktop::SqliteSettingsStore::new(path)
        .await
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
    Ok(Arc::new(store))
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
async fn default_settings_store(_path: &Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(missing("SettingsStore", "the persistence preference"))
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
async fn default_record_store(path: &Option<PathBuf>) -> Result<Arc<dyn RecordStore>> {
    let path = path
        .clone()
        .ok_or_else(|| missing("RecordStore", "artist persistence"))?;
    let store =
        bridge_desktop::SqliteRecordStore::new(path, bridge_desktop::DEFAULT_RECORD_TABLE)
            .await
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
    Ok(Arc::new(store))
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
async fn default_record_store(_path: &Option<PathBuf>) -> Result<Arc<dyn RecordStore>> {
    Err(missing("RecordStore", "artist persistence"))
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: CoreDependencies,
    artists: ArtistResolver,
    events: EventBus,
}

impl CoreService {
    /// Validate `config`, resolve bridges, build the artist resolver and
    /// hydrate it from durable storage.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let deps = CoreDependencies::from_config(&config).await?;
        Self::with_dependencies(&config, deps).await
    }

    /// Build the service from an already-resolved dependency bundle.
    pub async fn with_dependencies(config: &CoreConfig, deps: CoreDependencies) -> Result<Self> {
        let events = EventBus::new(config.event_buffer_size);

        let artists = ArtistResolver::builder()
            .sources_from_config(Arc::clone(&deps.http_client), &config.metadata_api_config)
            .record_store(Arc::clone(&deps.record_store))
            .settings_store(Arc::clone(&deps.settings_store))
            .preference_key(config.persist_preference_key.as_str())
            .event_bus(events.clone())
            .build()?;

        artists.hydrate().await;

        info!(
            cached = artists.snapshot().len(),
            deezer_proxied = config.metadata_api_config.deezer_proxy_url.is_some(),
            rate_limit_ms = config.metadata_api_config.rate_limit_delay_ms,
            "Core service ready"
        );

        Ok(Self {
            deps,
            artists,
            events,
        })
    }

    /// Artist resolution entry point.
    pub fn artists(&self) -> &ArtistResolver {
        &self.artists
    }

    /// Event bus carrying artist cache changes and source failures.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> &CoreDependencies {
        &self.deps
    }
}
