//! Deezer API Client
//!
//! ## API Endpoints
//!
//! - **Artist Search**: `https://api.deezer.com/search/artist?q={name}&limit=1`
//!
//! ## Routing
//!
//! Deezer does not send CORS headers, so browser-embedded hosts reach it
//! through a proxy that forwards `{proxy}/search/artist?...` unchanged.
//! [`DeezerRoute`] captures that choice; the rest of the pipeline never sees it.
//!
//! ## Picture Filtering
//!
//! Artists without a picture still carry URLs, pointing at a generic
//! silhouette under `/images/artist//`. Candidates are tried in the order
//! big, medium, xl, small and only an https URL on a `*.dzcdn.net` host with
//! a non-placeholder path is accepted.

use crate::error::Result;
use crate::models::{ArtworkMatch, SourceOutcome};
use crate::providers::{fetch_json, non_empty, ArtworkSource};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Deezer public API base URL
pub const DEEZER_API_BASE: &str = "https://api.deezer.com";

/// Trusted picture CDN host suffix
const TRUSTED_CDN_SUFFIX: &str = ".dzcdn.net";

/// Path segment of the "no picture" silhouette
const PLACEHOLDER_SEGMENT: &str = "/images/artist//";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const SERVICE: &str = "Deezer";

/// How the Deezer API is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeezerRoute {
    /// Call `api.deezer.com` (or an override) directly
    Direct { base_url: String },
    /// Call through a forwarding proxy
    Proxied { base_url: String },
}

impl DeezerRoute {
    pub fn direct() -> Self {
        Self::Direct {
            base_url: DEEZER_API_BASE.to_string(),
        }
    }

    /// Pick the route from an optional proxy setting
    pub fn from_config(direct_base: &str, proxy: Option<&str>) -> Self {
        match proxy {
            Some(base_url) => Self::Proxied {
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            None => Self::Direct {
                base_url: direct_base.trim_end_matches('/').to_string(),
            },
        }
    }

    fn base_url(&self) -> &str {
        match self {
            Self::Direct { base_url } | Self::Proxied { base_url } => base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<DeezerArtist>,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    link: Option<String>,
    picture_small: Option<String>,
    picture_medium: Option<String>,
    picture_big: Option<String>,
    picture_xl: Option<String>,
}

impl DeezerArtist {
    /// First trusted picture in preference order
    fn best_picture(&self) -> Option<String> {
        [
            &self.picture_big,
            &self.picture_medium,
            &self.picture_xl,
            &self.picture_small,
        ]
        .into_iter()
        .flatten()
        .find(|url| is_trusted_picture(url))
        .cloned()
    }
}

/// `https://<anything>.dzcdn.net/<path>` where path is not the placeholder
fn is_trusted_picture(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("https://") else {
        return false;
    };
    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let host = host.to_ascii_lowercase();

    host.len() > TRUSTED_CDN_SUFFIX.len()
        && host.ends_with(TRUSTED_CDN_SUFFIX)
        && !path.contains(PLACEHOLDER_SEGMENT)
}

/// Deezer client
pub struct DeezerClient {
    http_client: Arc<dyn HttpClient>,
    route: DeezerRoute,
}

impl DeezerClient {
    pub fn new(http_client: Arc<dyn HttpClient>, route: DeezerRoute) -> Self {
        Self { http_client, route }
    }

    pub fn route(&self) -> &DeezerRoute {
        &self.route
    }

    async fn fetch_artwork(&self, artist_name: &str) -> Result<Option<ArtworkMatch>> {
        let url = format!(
            "{}/search/artist?q={}&limit=1",
            self.route.base_url(),
            urlencoding::encode(artist_name)
        );

        debug!(artist = %artist_name, route = ?self.route, "Searching Deezer artist");

        let request = HttpRequest::get(url).accept_json().timeout(REQUEST_TIMEOUT);
        let response: SearchResponse =
            fetch_json(self.http_client.as_ref(), request, SERVICE).await?;

        let Some(artist) = response.data.into_iter().next() else {
            return Ok(None);
        };

        let found = ArtworkMatch {
            image_url: artist.best_picture(),
            profile_url: non_empty(artist.link),
        };

        Ok((!found.is_empty()).then_some(found))
    }
}

#[async_trait]
impl ArtworkSource for DeezerClient {
    fn name(&self) -> &'static str {
        "deezer"
    }

    async fn search_artwork(&self, name: &str) -> SourceOutcome<ArtworkMatch> {
        self.fetch_artwork(name).await.into()
    }
}
