//! Artist data model
//!
//! [`ArtistRecord`] is the canonical result of a resolution and the value
//! stored in the durable cache (camelCase JSON). The per-source partial
//! results ([`PrimaryMatch`], [`ArtworkMatch`]) never leave this crate's
//! resolution path.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder tag value that is never looked up
pub const UNKNOWN_ARTIST: &str = "unknown artist";

/// Normalized artist identity used for caching and deduplication.
///
/// Two display names that trim and lowercase to the same string are the same
/// artist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtistKey(String);

impl ArtistKey {
    /// Normalize a display name. Never fails; see [`ArtistKey::is_resolvable`].
    pub fn normalize(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Normalize a display name, returning `None` for keys that are never
    /// resolved (empty or the unknown-artist placeholder).
    pub fn parse(name: &str) -> Option<Self> {
        let key = Self::normalize(name);
        key.is_resolvable().then_some(key)
    }

    pub fn is_resolvable(&self) -> bool {
        !self.0.is_empty() && self.0 != UNKNOWN_ARTIST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ArtistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtistKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical resolved artist metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRecord {
    /// Display name (MusicBrainz canonical name, or the query text)
    pub name: String,
    /// MusicBrainz identifier
    pub mbid: Option<String>,
    /// "Person", "Group", ...
    pub artist_type: Option<String>,
    /// ISO 3166-1 country code
    pub country: Option<String>,
    pub disambiguation: Option<String>,
    pub image_url: Option<String>,
    pub musicbrainz_url: Option<String>,
    pub audiodb_url: Option<String>,
    pub deezer_url: Option<String>,
}

impl ArtistRecord {
    /// A record with only a name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mbid: None,
            artist_type: None,
            country: None,
            disambiguation: None,
            image_url: None,
            musicbrainz_url: None,
            audiodb_url: None,
            deezer_url: None,
        }
    }
}

/// A link attached to a MusicBrainz artist (official site, socials, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRelation {
    pub relation_type: String,
    pub url: String,
}

/// Best-ranked match from the primary metadata source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryMatch {
    pub mbid: String,
    pub name: String,
    pub artist_type: Option<String>,
    pub country: Option<String>,
    pub disambiguation: Option<String>,
    pub profile_url: String,
}

/// Image and profile link from an artwork source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtworkMatch {
    pub image_url: Option<String>,
    pub profile_url: Option<String>,
}

impl ArtworkMatch {
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.profile_url.is_none()
    }
}

/// Result of a single source lookup
#[derive(Debug)]
pub enum SourceOutcome<T> {
    Found(T),
    NotFound,
    Errored(MetadataError),
}

impl<T> SourceOutcome<T> {
    /// Wrap an optional value as `Found`/`NotFound`
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }

    /// Collapse to "result or nothing"
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound | Self::Errored(_) => None,
        }
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored(_))
    }
}

impl<T> From<crate::error::Result<Option<T>>> for SourceOutcome<T> {
    fn from(result: crate::error::Result<Option<T>>) -> Self {
        match result {
            Ok(value) => Self::from_option(value),
            Err(e) => Self::Errored(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        assert_eq!(ArtistKey::normalize("  Radiohead ").as_str(), "radiohead");
        assert_eq!(
            ArtistKey::normalize("Sigur Rós"),
            ArtistKey::normalize("SIGUR RÓS")
        );
    }

    #[test]
    fn test_unresolvable_keys() {
        assert!(ArtistKey::parse("").is_none());
        assert!(ArtistKey::parse("   ").is_none());
        assert!(ArtistKey::parse("Unknown Artist").is_none());
        assert!(ArtistKey::parse(" unknown artist ").is_none());
        assert!(ArtistKey::parse("Unknown Artists").is_some());
    }

    #[test]
    fn test_record_json_is_camel_case() {
        let mut record = ArtistRecord::named("Björk");
        record.artist_type = Some("Person".to_string());
        record.image_url = Some("https://example.com/b.jpg".to_string());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["artistType"], "Person");
        assert_eq!(json["imageUrl"], "https://example.com/b.jpg");
        assert!(json["mbid"].is_null());
    }

    #[test]
    fn test_record_tolerates_missing_optional_fields() {
        let record: ArtistRecord = serde_json::from_str(r#"{"name":"Low"}"#).unwrap();
        assert_eq!(record, ArtistRecord::named("Low"));
    }

    #[test]
    fn test_outcome_collapse() {
        let found: SourceOutcome<u8> = Ok(Some(1)).into();
        let missing: SourceOutcome<u8> = Ok(None).into();
        let failed: SourceOutcome<u8> =
            Err(MetadataError::NetworkError("timeout".to_string())).into();

        assert!(failed.is_errored());
        assert_eq!(found.found(), Some(1));
        assert_eq!(missing.found(), None);
        assert_eq!(failed.found(), None);
    }
}
