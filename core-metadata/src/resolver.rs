//! Artist Resolver
//!
//! Cache-first, request-coalescing entry point for artist metadata.
//!
//! ## Resolution flow
//!
//! 1. The name is normalized to an [`ArtistKey`]. Empty names and the
//!    "unknown artist" placeholder resolve to `None` without side effects.
//! 2. A cached entry (including a negative one) is returned immediately.
//! 3. A key that is already being resolved is joined: the caller waits for
//!    the pending result and no second fetch happens.
//! 4. Otherwise the key is admitted and reserves the next MusicBrainz turn.
//!    Turns are spaced by the configured delay and granted in admission
//!    order across all keys.
//! 5. A spawned task waits for the turn, queries MusicBrainz, TheAudioDB and
//!    Deezer concurrently, merges the results, commits them to the cache and
//!    the durable mirror, then wakes every waiter.
//!
//! Dropping a `resolve` future only stops that caller from waiting. The
//! spawned resolution always runs to completion.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::ArtistResolver;
//!
//! let resolver = ArtistResolver::builder()
//!     .sources_from_config(http_client, &config.metadata_api_config)
//!     .record_store(record_store)
//!     .settings_store(settings_store)
//!     .build()?;
//!
//! resolver.hydrate().await;
//! if let Some(artist) = resolver.resolve("Radiohead").await {
//!     println!("{} {:?}", artist.name, artist.image_url);
//! }
//! ```

use crate::aggregate::aggregate;
use crate::cache::CacheTable;
use crate::error::{MetadataError, Result};
use crate::models::{ArtistKey, ArtistRecord, SourceOutcome, UrlRelation};
use crate::persistence::Persistence;
use crate::providers::{
    ArtworkSource, AudioDbClient, DeezerClient, DeezerRoute, MusicBrainzClient, PrimarySource,
};
use crate::rate_gate::{RateGate, Turn};
use bridge_traits::http::HttpClient;
use bridge_traits::storage::{RecordStore, SettingsStore};
use core_runtime::config::{
    MetadataApiConfig, DEFAULT_PERSIST_PREFERENCE_KEY, DEFAULT_RATE_LIMIT_DELAY_MS,
    MAX_RATE_LIMIT_DELAY_MS,
};
use core_runtime::events::{ArtistEvent, CoreEvent, EventBus, Receiver, SourceEvent};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Pending result shared by every caller waiting on one key
type Pending = watch::Receiver<Option<Option<ArtistRecord>>>;

enum Admission {
    Cached(Option<ArtistRecord>),
    Waiting(Pending),
}

/// Artist metadata resolver
///
/// Cheap to clone; clones share the cache, the in-flight set and the rate
/// gate.
#[derive(Clone)]
pub struct ArtistResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    primary: Arc<dyn PrimarySource>,
    audiodb: Arc<dyn ArtworkSource>,
    deezer: Arc<dyn ArtworkSource>,
    cache: CacheTable,
    in_flight: Mutex<HashMap<ArtistKey, Pending>>,
    gate: RateGate,
    persistence: Persistence,
    events: EventBus,
    hydrated: tokio::sync::Mutex<bool>,
}

impl ArtistResolver {
    pub fn builder() -> ArtistResolverBuilder {
        ArtistResolverBuilder::default()
    }

    /// Resolve an artist name to its metadata.
    ///
    /// Returns `None` for unresolvable names and when no source knows the
    /// artist. Upstream failures are never surfaced here; see
    /// [`SourceEvent::Failed`] and the logs.
    pub async fn resolve(&self, name: &str) -> Option<ArtistRecord> {
        let key = ArtistKey::parse(name)?;

        if let Some(hit) = self.inner.cache.get(&key) {
            return hit;
        }

        let mut pending = match self.admit(&key, name) {
            Admission::Cached(hit) => return hit,
            Admission::Waiting(pending) => pending,
        };

        // Bound to a local so the borrow of `pending` ends before it drops
        let result = match pending.wait_for(Option::is_some).await {
            Ok(result) => result.clone().flatten(),
            Err(_) => {
                warn!(key = %key, "Resolution ended without a result");
                self.inner.cache.get(&key).flatten()
            }
        };
        result
    }

    /// Join an in-flight resolution or start a new one
    fn admit(&self, key: &ArtistKey, name: &str) -> Admission {
        let mut in_flight = self.inner.in_flight();

        // A resolution may have committed between the cache check and the lock
        if let Some(hit) = self.inner.cache.get(key) {
            return Admission::Cached(hit);
        }

        if let Some(pending) = in_flight.get(key) {
            debug!(key = %key, "Joining in-flight resolution");
            return Admission::Waiting(pending.clone());
        }

        let (tx, rx) = watch::channel(None);
        in_flight.insert(key.clone(), rx.clone());
        let turn = self.inner.gate.reserve();
        drop(in_flight);

        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        let query = name.trim().to_string();
        tokio::spawn(async move {
            inner.run(key, query, turn, tx).await;
        });

        Admission::Waiting(rx)
    }

    /// Links attached to a MusicBrainz artist. Bypasses the cache and the
    /// rate gate; any failure yields an empty list.
    pub async fn url_relations(&self, mbid: &str) -> Vec<UrlRelation> {
        let mbid = mbid.trim();
        if mbid.is_empty() {
            return Vec::new();
        }

        let outcome = self.inner.primary.url_relations(mbid).await;
        self.inner
            .settle(mbid, self.inner.primary.name(), outcome)
            .unwrap_or_default()
    }

    /// Peek at the cache. The outer `None` means the name was never resolved.
    pub fn cached(&self, name: &str) -> Option<Option<ArtistRecord>> {
        let key = ArtistKey::parse(name)?;
        self.inner.cache.get(&key)
    }

    pub fn is_in_flight(&self, name: &str) -> bool {
        ArtistKey::parse(name)
            .map(|key| self.inner.in_flight().contains_key(&key))
            .unwrap_or(false)
    }

    /// Copy of the whole cache, keyed by normalized name
    pub fn snapshot(&self) -> HashMap<String, Option<ArtistRecord>> {
        self.inner.cache.snapshot()
    }

    /// Forget one artist. Returns whether an entry existed.
    pub async fn remove(&self, name: &str) -> bool {
        let Some(key) = ArtistKey::parse(name) else {
            return false;
        };
        let existed = self.inner.cache.remove(&key).is_some();
        self.inner.persistence.remove(&key).await;

        debug!(key = %key, existed, "Removed artist entry");
        self.inner.emit(ArtistEvent::Removed {
            key: key.into_string(),
        });
        existed
    }

    /// Forget every artist. In-flight resolutions still commit when done.
    pub async fn clear(&self) {
        let count = self.inner.cache.len();
        self.inner.cache.clear();
        self.inner.persistence.clear().await;

        info!(count, "Cleared artist cache");
        self.inner.emit(ArtistEvent::Cleared);
    }

    /// Load the durable cache into memory.
    ///
    /// Runs once per resolver. Entries already in memory are kept. A failed
    /// read is logged and still counts as hydrated.
    pub async fn hydrate(&self) {
        let mut hydrated = self.inner.hydrated.lock().await;
        if *hydrated {
            return;
        }
        *hydrated = true;

        if !self.inner.persistence.is_enabled().await {
            debug!("Artist persistence disabled; skipping hydration");
            return;
        }

        match self.inner.persistence.load().await {
            Ok(entries) => {
                let loaded = self.inner.cache.merge_missing(entries);
                info!(loaded, total = self.inner.cache.len(), "Hydrated artist cache");
                self.inner.emit(ArtistEvent::Hydrated { loaded });
            }
            Err(e) => {
                warn!(error = %e, "Failed to hydrate artist cache");
            }
        }
    }

    pub async fn is_hydrated(&self) -> bool {
        *self.inner.hydrated.lock().await
    }

    /// Subscribe to cache changes and source failures
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.events
    }

    pub(crate) fn is_cached(&self, key: &ArtistKey) -> bool {
        self.inner.cache.contains(key)
    }
}

impl ResolverInner {
    fn in_flight(&self) -> MutexGuard<'_, HashMap<ArtistKey, Pending>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(skip_all, fields(key = %key))]
    async fn run(
        &self,
        key: ArtistKey,
        query: String,
        turn: Turn,
        tx: watch::Sender<Option<Option<ArtistRecord>>>,
    ) {
        let in_flight = InFlight {
            inner: self,
            key: key.clone(),
        };
        self.gate.wait(turn).await;

        let result = AssertUnwindSafe(self.fetch(&key, &query))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(key = %key, "Artist resolution panicked; caching as not found");
                None
            });

        self.cache.insert(key.clone(), result.clone());
        if AssertUnwindSafe(self.persistence.store(&key, result.as_ref()))
            .catch_unwind()
            .await
            .is_err()
        {
            error!(key = %key, "Mirroring artist entry panicked");
        }
        drop(in_flight);

        let found = result.is_some();
        debug!(key = %key, found, "Artist resolved");
        self.emit(ArtistEvent::Resolved {
            key: key.into_string(),
            found,
        });

        // Every waiter may have given up already
        let _ = tx.send(Some(result));
    }

    async fn fetch(&self, key: &ArtistKey, query: &str) -> Option<ArtistRecord> {
        let (primary, audiodb, deezer) = tokio::join!(
            self.primary.search_artist(query),
            self.audiodb.search_artwork(query),
            self.deezer.search_artwork(query),
        );

        aggregate(
            query,
            self.settle(key.as_str(), self.primary.name(), primary),
            self.settle(key.as_str(), self.audiodb.name(), audiodb),
            self.settle(key.as_str(), self.deezer.name(), deezer),
        )
    }

    /// Collapse a source outcome, reporting failures
    fn settle<T>(&self, key: &str, source: &str, outcome: SourceOutcome<T>) -> Option<T> {
        if let SourceOutcome::Errored(e) = &outcome {
            warn!(key, source, error = %e, "Artist source failed");
            let _ = self.events.emit(CoreEvent::Source(SourceEvent::Failed {
                source: source.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            }));
        }
        outcome.found()
    }

    fn emit(&self, event: ArtistEvent) {
        // No subscribers is fine
        let _ = self.events.emit(CoreEvent::Artist(event));
    }
}

/// Takes a key out of the in-flight set when dropped, including when the
/// resolution task is aborted or unwinds
struct InFlight<'a> {
    inner: &'a ResolverInner,
    key: ArtistKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.in_flight().remove(&self.key);
    }
}

/// Builder for [`ArtistResolver`]
pub struct ArtistResolverBuilder {
    primary: Option<Arc<dyn PrimarySource>>,
    audiodb: Option<Arc<dyn ArtworkSource>>,
    deezer: Option<Arc<dyn ArtworkSource>>,
    min_interval: Duration,
    record_store: Option<Arc<dyn RecordStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    preference_key: String,
    events: Option<EventBus>,
}

impl Default for ArtistResolverBuilder {
    fn default() -> Self {
        Self {
            primary: None,
            audiodb: None,
            deezer: None,
            min_interval: Duration::from_millis(DEFAULT_RATE_LIMIT_DELAY_MS),
            record_store: None,
            settings_store: None,
            preference_key: DEFAULT_PERSIST_PREFERENCE_KEY.to_string(),
            events: None,
        }
    }
}

impl ArtistResolverBuilder {
    pub fn primary(mut self, source: Arc<dyn PrimarySource>) -> Self {
        self.primary = Some(source);
        self
    }

    /// Preferred artwork source
    pub fn audiodb(mut self, source: Arc<dyn ArtworkSource>) -> Self {
        self.audiodb = Some(source);
        self
    }

    /// Fallback artwork source
    pub fn deezer(mut self, source: Arc<dyn ArtworkSource>) -> Self {
        self.deezer = Some(source);
        self
    }

    /// Build the three HTTP sources and the rate limit from configuration
    pub fn sources_from_config(
        self,
        http_client: Arc<dyn HttpClient>,
        config: &MetadataApiConfig,
    ) -> Self {
        let primary = MusicBrainzClient::new(
            Arc::clone(&http_client),
            config.musicbrainz_user_agent.clone(),
        )
        .with_base_url(config.musicbrainz_base_url.as_str());
        let audiodb = AudioDbClient::new(Arc::clone(&http_client), config.audiodb_api_key.as_str())
            .with_base_url(config.audiodb_base_url.as_str());
        let route = DeezerRoute::from_config(
            &config.deezer_base_url,
            config.deezer_proxy_url.as_deref(),
        );
        let deezer = DeezerClient::new(http_client, route);

        self.primary(Arc::new(primary))
            .audiodb(Arc::new(audiodb))
            .deezer(Arc::new(deezer))
            .rate_limit(Duration::from_millis(config.rate_limit_delay_ms))
    }

    /// Minimum spacing between MusicBrainz turns
    pub fn rate_limit(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Settings key of the persistence toggle
    pub fn preference_key(mut self, key: impl Into<String>) -> Self {
        self.preference_key = key.into();
        self
    }

    /// Publish into an existing bus instead of a private one
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<ArtistResolver> {
        let primary = self
            .primary
            .ok_or_else(|| MetadataError::Config("primary source is required".to_string()))?;
        let audiodb = self
            .audiodb
            .ok_or_else(|| MetadataError::Config("TheAudioDB source is required".to_string()))?;
        let deezer = self
            .deezer
            .ok_or_else(|| MetadataError::Config("Deezer source is required".to_string()))?;

        if self.min_interval.is_zero() {
            return Err(MetadataError::Config(
                "rate limit must be greater than zero".to_string(),
            ));
        }
        if self.min_interval > Duration::from_millis(MAX_RATE_LIMIT_DELAY_MS) {
            return Err(MetadataError::Config(format!(
                "rate limit must not exceed {}ms",
                MAX_RATE_LIMIT_DELAY_MS
            )));
        }

        debug!(
            primary = primary.name(),
            audiodb = audiodb.name(),
            deezer = deezer.name(),
            min_interval = ?self.min_interval,
            persistent = self.record_store.is_some(),
            "Built artist resolver"
        );

        Ok(ArtistResolver {
            inner: Arc::new(ResolverInner {
                primary,
                audiodb,
                deezer,
                cache: CacheTable::default(),
                in_flight: Mutex::new(HashMap::new()),
                gate: RateGate::new(self.min_interval),
                persistence: Persistence::new(
                    self.record_store,
                    self.settings_store,
                    self.preference_key,
                ),
                events: self.events.unwrap_or_default(),
                hydrated: tokio::sync::Mutex::new(false),
            }),
        })
    }
}

impl std::fmt::Debug for ArtistResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtistResolver")
            .field("cached", &self.inner.cache.len())
            .field("in_flight", &self.inner.in_flight().len())
            .field("min_interval", &self.inner.gate.min_interval())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtworkMatch, PrimaryMatch};
    use async_trait::async_trait;

    struct Nothing;

    #[async_trait]
    impl PrimarySource for Nothing {
        fn name(&self) -> &'static str {
            "nothing"
        }
        async fn search_artist(&self, _name: &str) -> SourceOutcome<PrimaryMatch> {
            SourceOutcome::NotFound
        }
        async fn url_relations(&self, _mbid: &str) -> SourceOutcome<Vec<UrlRelation>> {
            SourceOutcome::Errored(MetadataError::NetworkError("offline".to_string()))
        }
    }

    #[async_trait]
    impl ArtworkSource for Nothing {
        fn name(&self) -> &'static str {
            "nothing"
        }
        async fn search_artwork(&self, _name: &str) -> SourceOutcome<ArtworkMatch> {
            SourceOutcome::NotFound
        }
    }

    fn resolver() -> ArtistResolver {
        ArtistResolver::builder()
            .primary(Arc::new(Nothing))
            .audiodb(Arc::new(Nothing))
            .deezer(Arc::new(Nothing))
            .rate_limit(Duration::from_millis(10))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_sources() {
        let err = ArtistResolver::builder()
            .primary(Arc::new(Nothing))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("TheAudioDB"));
    }

    #[test]
    fn test_builder_rejects_zero_rate_limit() {
        let result = ArtistResolver::builder()
            .primary(Arc::new(Nothing))
            .audiodb(Arc::new(Nothing))
            .deezer(Arc::new(Nothing))
            .rate_limit(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_huge_rate_limit() {
        let result = ArtistResolver::builder()
            .primary(Arc::new(Nothing))
            .audiodb(Arc::new(Nothing))
            .deezer(Arc::new(Nothing))
            .rate_limit(Duration::MAX)
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove_ignores_unresolvable_names() {
        let resolver = resolver();
        let mut events = resolver.subscribe();

        assert!(!resolver.remove("").await);
        assert!(!resolver.remove("Unknown Artist").await);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_negative_result_is_cached() {
        let resolver = resolver();

        assert_eq!(resolver.resolve("Nobody").await, None);
        assert_eq!(resolver.cached("  NOBODY "), Some(None));
        assert!(!resolver.is_in_flight("nobody"));
    }

    #[tokio::test]
    async fn test_url_relations_failure_is_empty() {
        let resolver = resolver();
        let mut events = resolver.subscribe();

        assert!(resolver.url_relations("abc").await.is_empty());
        assert!(resolver.url_relations("  ").await.is_empty());

        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Source(SourceEvent::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_hydrate_without_store_marks_hydrated() {
        let resolver = resolver();
        assert!(!resolver.is_hydrated().await);

        resolver.hydrate().await;
        assert!(resolver.is_hydrated().await);
    }
}
