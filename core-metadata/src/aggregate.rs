//! Merge per-source lookups into one [`ArtistRecord`]

use crate::models::{ArtistRecord, ArtworkMatch, PrimaryMatch};

/// Combine the three lookups for `query`.
///
/// TheAudioDB's image wins over Deezer's. Each source only fills its own
/// link field. Returns `None` when MusicBrainz found nothing and neither
/// artwork source produced an image; profile links alone are not enough.
pub fn aggregate(
    query: &str,
    primary: Option<PrimaryMatch>,
    audiodb: Option<ArtworkMatch>,
    deezer: Option<ArtworkMatch>,
) -> Option<ArtistRecord> {
    let audiodb = audiodb.unwrap_or_default();
    let deezer = deezer.unwrap_or_default();

    let image_url = audiodb.image_url.or(deezer.image_url);
    if primary.is_none() && image_url.is_none() {
        return None;
    }

    let mut record = ArtistRecord::named(query.trim());
    record.image_url = image_url;
    record.audiodb_url = audiodb.profile_url;
    record.deezer_url = deezer.profile_url;

    if let Some(primary) = primary {
        record.name = primary.name;
        record.mbid = Some(primary.mbid);
        record.artist_type = primary.artist_type;
        record.country = primary.country;
        record.disambiguation = primary.disambiguation;
        record.musicbrainz_url = Some(primary.profile_url);
    }

    Some(record)
}
