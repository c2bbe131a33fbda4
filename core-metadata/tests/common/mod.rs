//! Fakes shared by the resolver integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{RecordStore, SettingsStore};
use core_metadata::{
    ArtistResolver, ArtworkMatch, ArtworkSource, MetadataError, PrimaryMatch, PrimarySource,
    SourceOutcome, UrlRelation,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const PERSIST_KEY: &str = "persist_artist_data";

/// MusicBrainz stand-in keyed by lowercase name
#[derive(Default)]
pub struct FakePrimary {
    known: HashMap<String, PrimaryMatch>,
    delay: Duration,
    panic_on: Option<String>,
    fail: bool,
    calls: AtomicUsize,
    started: Mutex<Vec<(String, Instant)>>,
}

impl FakePrimary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn knowing(mut self, name: &str) -> Self {
        let mbid = format!("mbid-{}", name.to_lowercase().replace(' ', "-"));
        self.known.insert(
            name.to_lowercase(),
            PrimaryMatch {
                profile_url: format!("https://musicbrainz.org/artist/{}", mbid),
                mbid,
                name: name.to_string(),
                artist_type: Some("Group".to_string()),
                country: Some("GB".to_string()),
                disambiguation: None,
            },
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn panicking_on(mut self, name: &str) -> Self {
        self.panic_on = Some(name.to_lowercase());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Query text and start time of every search, in call order
    pub fn started(&self) -> Vec<(String, Instant)> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrimarySource for FakePrimary {
    fn name(&self) -> &'static str {
        "musicbrainz"
    }

    async fn search_artist(&self, name: &str) -> SourceOutcome<PrimaryMatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started
            .lock()
            .unwrap()
            .push((name.to_string(), Instant::now()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic_on.as_deref() == Some(name.to_lowercase().as_str()) {
            panic!("primary source blew up");
        }
        if self.fail {
            return SourceOutcome::Errored(MetadataError::HttpError {
                status: 503,
                body: "MusicBrainz request failed".to_string(),
            });
        }

        SourceOutcome::from_option(self.known.get(&name.to_lowercase()).cloned())
    }

    async fn url_relations(&self, mbid: &str) -> SourceOutcome<Vec<UrlRelation>> {
        SourceOutcome::Found(vec![UrlRelation {
            relation_type: "official homepage".to_string(),
            url: format!("https://example.com/{}", mbid),
        }])
    }
}

/// Artwork stand-in keyed by lowercase name
pub struct FakeArtwork {
    service: &'static str,
    images: HashMap<String, String>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeArtwork {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            images: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_image(mut self, name: &str, url: &str) -> Self {
        self.images.insert(name.to_lowercase(), url.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtworkSource for FakeArtwork {
    fn name(&self) -> &'static str {
        self.service
    }

    async fn search_artwork(&self, name: &str) -> SourceOutcome<ArtworkMatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return SourceOutcome::Errored(MetadataError::NetworkError(
                "connection refused".to_string(),
            ));
        }

        SourceOutcome::from_option(self.images.get(&name.to_lowercase()).map(|url| {
            ArtworkMatch {
                image_url: Some(url.clone()),
                profile_url: Some(format!("https://{}.example/{}", self.service, name)),
            }
        }))
    }
}

/// In-memory durable store with operation counters
#[derive(Default)]
pub struct MemoryRecords {
    pub rows: Mutex<HashMap<String, Option<String>>>,
    pub loads: AtomicUsize,
    pub puts: AtomicUsize,
    pub clears: AtomicUsize,
    pub fail_reads: bool,
    pub panic_on_put: bool,
}

impl MemoryRecords {
    pub fn with_rows(rows: &[(&str, Option<&str>)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.rows.lock().unwrap();
            for (key, value) in rows {
                map.insert(key.to_string(), value.map(str::to_string));
            }
        }
        store
    }

    pub fn row(&self, key: &str) -> Option<Option<String>> {
        self.rows.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecords {
    async fn get_all(&self) -> BridgeResult<HashMap<String, Option<String>>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(BridgeError::Storage("database is locked".to_string()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn put(&self, key: &str, value: Option<&str>) -> BridgeResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_put {
            panic!("record store blew up");
        }
        self.rows
            .lock()
            .unwrap()
            .insert(key.to_string(), value.map(str::to_string));
        Ok(())
    }

    async fn remove(&self, key: &str) -> BridgeResult<()> {
        self.rows.lock().unwrap().remove(key);
        Ok(())
    }

    async fn clear(&self) -> BridgeResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}

/// Settings store holding only booleans
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, bool>>,
}

impl MemorySettings {
    pub fn persist(enabled: bool) -> Self {
        let settings = Self::default();
        settings
            .values
            .lock()
            .unwrap()
            .insert(PERSIST_KEY.to_string(), enabled);
        settings
    }

    pub fn set_persist(&self, enabled: bool) {
        self.values
            .lock()
            .unwrap()
            .insert(PERSIST_KEY.to_string(), enabled);
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
        Err(BridgeError::NotAvailable("strings".to_string()))
    }

    async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
        Ok(None)
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.values.lock().unwrap().get(key).copied())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().unwrap().keys().cloned().collect())
    }
}

/// Sources plus the resolver wired to them
pub struct Harness {
    pub primary: Arc<FakePrimary>,
    pub audiodb: Arc<FakeArtwork>,
    pub deezer: Arc<FakeArtwork>,
    pub resolver: ArtistResolver,
}

impl Harness {
    pub fn new(primary: FakePrimary, audiodb: FakeArtwork, deezer: FakeArtwork) -> Self {
        Self::with_stores(primary, audiodb, deezer, None, None)
    }

    pub fn with_stores(
        primary: FakePrimary,
        audiodb: FakeArtwork,
        deezer: FakeArtwork,
        records: Option<Arc<MemoryRecords>>,
        settings: Option<Arc<MemorySettings>>,
    ) -> Self {
        Self::build(
            primary,
            audiodb,
            deezer,
            records,
            settings,
            Duration::from_millis(1000),
        )
    }

    pub fn with_rate_limit(
        primary: FakePrimary,
        audiodb: FakeArtwork,
        deezer: FakeArtwork,
        min_interval: Duration,
    ) -> Self {
        Self::build(primary, audiodb, deezer, None, None, min_interval)
    }

    fn build(
        primary: FakePrimary,
        audiodb: FakeArtwork,
        deezer: FakeArtwork,
        records: Option<Arc<MemoryRecords>>,
        settings: Option<Arc<MemorySettings>>,
        min_interval: Duration,
    ) -> Self {
        let primary = Arc::new(primary);
        let audiodb = Arc::new(audiodb);
        let deezer = Arc::new(deezer);

        let mut builder = ArtistResolver::builder()
            .primary(primary.clone())
            .audiodb(audiodb.clone())
            .deezer(deezer.clone())
            .rate_limit(min_interval)
            .preference_key(PERSIST_KEY);
        if let Some(records) = records {
            builder = builder.record_store(records);
        }
        if let Some(settings) = settings {
            builder = builder.settings_store(settings);
        }

        Self {
            primary,
            audiodb,
            deezer,
            resolver: builder.build().unwrap(),
        }
    }

    /// Total adapter invocations across all three sources
    pub fn total_calls(&self) -> usize {
        self.primary.calls() + self.audiodb.calls() + self.deezer.calls()
    }
}

pub fn audiodb() -> FakeArtwork {
    FakeArtwork::new("theaudiodb")
}

pub fn deezer() -> FakeArtwork {
    FakeArtwork::new("deezer")
}
