//! TheAudioDB API Client
//!
//! ## API Endpoints
//!
//! - **Artist Search**: `https://www.theaudiodb.com/api/v1/json/{api_key}/search.php?s={name}`
//!
//! The public test key `2` is enough for artist search. A miss comes back as
//! `{"artists": null}`.

use crate::error::Result;
use crate::models::{ArtworkMatch, SourceOutcome};
use crate::providers::{fetch_json, non_empty, ArtworkSource};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// TheAudioDB JSON API base URL (without the key segment)
pub const AUDIODB_API_BASE: &str = "https://www.theaudiodb.com/api/v1/json";

const AUDIODB_ARTIST_PAGE: &str = "https://www.theaudiodb.com/artist";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const SERVICE: &str = "TheAudioDB";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Option<Vec<AudioDbArtist>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioDbArtist {
    id_artist: Option<String>,
    str_artist_thumb: Option<String>,
}

/// TheAudioDB client
pub struct AudioDbClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
}

impl AudioDbClient {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: AUDIODB_API_BASE.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_artwork(&self, artist_name: &str) -> Result<Option<ArtworkMatch>> {
        let url = format!(
            "{}/{}/search.php?s={}",
            self.base_url,
            self.api_key,
            urlencoding::encode(artist_name)
        );

        debug!(artist = %artist_name, "Searching TheAudioDB artist");

        let request = HttpRequest::get(url).accept_json().timeout(REQUEST_TIMEOUT);
        let response: SearchResponse =
            fetch_json(self.http_client.as_ref(), request, SERVICE).await?;

        let Some(artist) = response.artists.and_then(|a| a.into_iter().next()) else {
            return Ok(None);
        };

        let found = ArtworkMatch {
            image_url: non_empty(artist.str_artist_thumb),
            profile_url: non_empty(artist.id_artist)
                .map(|id| format!("{}/{}", AUDIODB_ARTIST_PAGE, id)),
        };

        Ok((!found.is_empty()).then_some(found))
    }
}

#[async_trait]
impl ArtworkSource for AudioDbClient {
    fn name(&self) -> &'static str {
        "theaudiodb"
    }

    async fn search_artwork(&self, name: &str) -> SourceOutcome<ArtworkMatch> {
        self.fetch_artwork(name).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{json_response, MockHttpClient};

    #[tokio::test]
    async fn test_thumb_and_profile_link() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .withf(|req| {
                req.url == "https://www.theaudiodb.com/api/v1/json/2/search.php?s=Massive%20Attack"
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{"artists":[{"idArtist":"111279","strArtist":"Massive Attack",
                        "strArtistThumb":"https://r2.theaudiodb.com/images/media/artist/thumb/ma.jpg"}]}"#,
                ))
            });

        let client = AudioDbClient::new(Arc::new(mock), "2");
        let found = client.search_artwork("Massive Attack").await.found().unwrap();

        assert_eq!(
            found.image_url.as_deref(),
            Some("https://r2.theaudiodb.com/images/media/artist/thumb/ma.jpg")
        );
        assert_eq!(
            found.profile_url.as_deref(),
            Some("https://www.theaudiodb.com/artist/111279")
        );
    }

    #[tokio::test]
    async fn test_null_artists_is_not_found() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(json_response(200, r#"{"artists":null}"#)));

        let client = AudioDbClient::new(Arc::new(mock), "2");
        assert!(matches!(
            client.search_artwork("zzzz").await,
            SourceOutcome::NotFound
        ));
    }

    #[tokio::test]
    async fn test_empty_thumb_keeps_profile_link() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().returning(|_| {
            Ok(json_response(
                200,
                r#"{"artists":[{"idArtist":"42","strArtistThumb":""}]}"#,
            ))
        });

        let client = AudioDbClient::new(Arc::new(mock), "2");
        let found = client.search_artwork("x").await.found().unwrap();
        assert_eq!(found.image_url, None);
        assert!(found.profile_url.is_some());
    }
}
