//! MusicBrainz API Client
//!
//! Primary source of canonical artist metadata.
//!
//! ## API Endpoints
//!
//! - **Artist Search**: `https://musicbrainz.org/ws/2/artist/?query=artist:{query}&fmt=json&limit=1`
//! - **URL Relations**: `https://musicbrainz.org/ws/2/artist/{mbid}?inc=url-rels&fmt=json`
//!
//! ## Rate Limiting
//!
//! MusicBrainz allows one request per second per client. This client does not
//! enforce it; every search goes through the resolver's rate gate. Relation
//! lookups are user-initiated and bypass the gate.
//!
//! ## User Agent Requirement
//!
//! MusicBrainz requires all API clients to identify themselves with a proper User-Agent header:
//! Format: "ApplicationName/Version (ContactEmail)"
//! Example: "MyMusicApp/1.0 (contact@example.com)"
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::{MusicBrainzClient, PrimarySource};
//! use std::sync::Arc;
//!
//! let client = MusicBrainzClient::new(
//!     http_client,
//!     "MyMusicApp/1.0 (contact@example.com)".to_string(),
//! );
//!
//! if let Some(artist) = client.search_artist("The Beatles").await.found() {
//!     println!("{} -> {}", artist.name, artist.mbid);
//! }
//! ```

use crate::error::Result;
use crate::models::{PrimaryMatch, SourceOutcome, UrlRelation};
use crate::providers::{fetch_json, non_empty, PrimarySource};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// MusicBrainz API base URL
pub const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

/// Public artist page
const MUSICBRAINZ_ARTIST_PAGE: &str = "https://musicbrainz.org/artist";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SERVICE: &str = "MusicBrainz";

/// MusicBrainz artist search response
#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistSearchResult>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResult {
    id: String,
    name: String,
    #[serde(rename = "type")]
    artist_type: Option<String>,
    country: Option<String>,
    disambiguation: Option<String>,
}

/// MusicBrainz artist lookup with `inc=url-rels`
#[derive(Debug, Deserialize)]
struct ArtistRelationsResponse {
    #[serde(default)]
    relations: Vec<Relation>,
}

#[derive(Debug, Deserialize)]
struct Relation {
    #[serde(rename = "type")]
    relation_type: Option<String>,
    url: Option<RelationUrl>,
}

#[derive(Debug, Deserialize)]
struct RelationUrl {
    resource: Option<String>,
}

/// MusicBrainz client
pub struct MusicBrainzClient {
    http_client: Arc<dyn HttpClient>,
    user_agent: String,
    base_url: String,
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `user_agent` - User-Agent header for MusicBrainz API (required by API terms)
    pub fn new(http_client: Arc<dyn HttpClient>, user_agent: String) -> Self {
        Self {
            http_client,
            user_agent,
            base_url: MUSICBRAINZ_API_BASE.to_string(),
        }
    }

    /// Point the client at a mirror or test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, url: String) -> HttpRequest {
        HttpRequest::get(url)
            .header("User-Agent", self.user_agent.clone())
            .accept_json()
            .timeout(REQUEST_TIMEOUT)
    }

    async fn fetch_best_match(&self, artist_name: &str) -> Result<Option<PrimaryMatch>> {
        let query = urlencoding::encode(&Self::escape_lucene_query(artist_name)).into_owned();
        let url = format!(
            "{}/artist/?query=artist:{}&fmt=json&limit=1",
            self.base_url, query
        );

        debug!(url = %url, "Searching MusicBrainz artist");

        let response: ArtistSearchResponse =
            fetch_json(self.http_client.as_ref(), self.request(url), SERVICE).await?;

        Ok(response.artists.into_iter().next().map(|artist| {
            debug!(name = %artist.name, mbid = %artist.id, "Best MusicBrainz match");
            PrimaryMatch {
                profile_url: format!("{}/{}", MUSICBRAINZ_ARTIST_PAGE, artist.id),
                mbid: artist.id,
                name: artist.name,
                artist_type: non_empty(artist.artist_type),
                country: non_empty(artist.country),
                disambiguation: non_empty(artist.disambiguation),
            }
        }))
    }

    async fn fetch_relations(&self, mbid: &str) -> Result<Vec<UrlRelation>> {
        let url = format!(
            "{}/artist/{}?inc=url-rels&fmt=json",
            self.base_url,
            urlencoding::encode(mbid)
        );

        debug!(url = %url, "Looking up MusicBrainz URL relations");

        let response: ArtistRelationsResponse =
            fetch_json(self.http_client.as_ref(), self.request(url), SERVICE).await?;

        Ok(response
            .relations
            .into_iter()
            .filter_map(|relation| {
                let url = non_empty(relation.url.and_then(|u| u.resource))?;
                Some(UrlRelation {
                    relation_type: relation.relation_type.unwrap_or_default(),
                    url,
                })
            })
            .collect())
    }

    /// Escape special Lucene query characters
    ///
    /// MusicBrainz uses Lucene for search, so we need to escape special characters.
    fn escape_lucene_query(query: &str) -> String {
        const SPECIAL_CHARS: &[char] = &[
            '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
            '\\', '/',
        ];

        let mut escaped = String::with_capacity(query.len());
        for c in query.chars() {
            if SPECIAL_CHARS.contains(&c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

#[async_trait]
impl PrimarySource for MusicBrainzClient {
    fn name(&self) -> &'static str {
        "musicbrainz"
    }

    async fn search_artist(&self, name: &str) -> SourceOutcome<PrimaryMatch> {
        self.fetch_best_match(name).await.into()
    }

    async fn url_relations(&self, mbid: &str) -> SourceOutcome<Vec<UrlRelation>> {
        self.fetch_relations(mbid).await.map(Some).into()
    }
}
