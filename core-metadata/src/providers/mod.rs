//! External Metadata Providers
//!
//! This module contains clients for the artist lookup services:
//! - MusicBrainz - canonical artist metadata and URL relations (primary)
//! - TheAudioDB - artist thumbnails
//! - Deezer - artist pictures, reached directly or through a proxy
//!
//! Providers never rate-limit and never retry by themselves. The resolver
//! owns the MusicBrainz quota, and the injected `HttpClient` owns transport
//! retries. Every lookup returns a [`SourceOutcome`] so failures can be
//! reported without ever reaching a `resolve` caller.

pub mod audiodb;
pub mod deezer;
pub mod musicbrainz;

pub use audiodb::AudioDbClient;
pub use deezer::{DeezerClient, DeezerRoute};
pub use musicbrainz::MusicBrainzClient;

use crate::error::{MetadataError, Result};
use crate::models::{ArtworkMatch, PrimaryMatch, SourceOutcome, UrlRelation};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::de::DeserializeOwned;

/// Source of canonical artist metadata
#[async_trait]
pub trait PrimarySource: Send + Sync {
    /// Short service name used in logs and events
    fn name(&self) -> &'static str;

    /// Best-ranked artist match for a free-text name
    async fn search_artist(&self, name: &str) -> SourceOutcome<PrimaryMatch>;

    /// Links attached to an artist identifier
    async fn url_relations(&self, mbid: &str) -> SourceOutcome<Vec<UrlRelation>>;
}

/// Source of artist images and profile links
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// Short service name used in logs and events
    fn name(&self) -> &'static str;

    async fn search_artwork(&self, name: &str) -> SourceOutcome<ArtworkMatch>;
}

/// Execute a request and decode a successful JSON body
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http_client: &dyn HttpClient,
    request: HttpRequest,
    service: &str,
) -> Result<T> {
    let response = http_client
        .execute(request)
        .await
        .map_err(|e| MetadataError::NetworkError(format!("{} request failed: {}", service, e)))?;

    if !response.is_success() {
        return Err(MetadataError::HttpError {
            status: response.status,
            body: format!("{} request failed", service),
        });
    }

    serde_json::from_slice(&response.body).map_err(|e| {
        MetadataError::JsonParse(format!("Failed to parse {} response: {}", service, e))
    })
}

/// Treat empty strings from upstream JSON as missing
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use bridge_traits::error::Result;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        pub HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> Result<HttpResponse>;
        }
    }

    pub fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }
}
