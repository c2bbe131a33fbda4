//! # Artist Metadata Module
//!
//! Resolves artist names to metadata and artwork from MusicBrainz,
//! TheAudioDB and Deezer.
//!
//! ## Overview
//!
//! This module handles:
//! - One lookup client per upstream service ([`providers`])
//! - Merging the three partial results into an [`ArtistRecord`]
//! - Cache-first, deduplicated, rate-limited resolution ([`ArtistResolver`])
//! - Hydrating and mirroring the cache through a durable `RecordStore`
//! - Sequential "resolve all" batches

pub mod aggregate;
mod batch;
mod cache;
pub mod error;
pub mod models;
mod persistence;
pub mod providers;
mod rate_gate;
pub mod resolver;

pub use aggregate::aggregate;
pub use batch::BatchReport;
pub use error::{MetadataError, Result};
pub use models::{
    ArtistKey, ArtistRecord, ArtworkMatch, PrimaryMatch, SourceOutcome, UrlRelation,
    UNKNOWN_ARTIST,
};
pub use providers::{ArtworkSource, PrimarySource};
pub use resolver::{ArtistResolver, ArtistResolverBuilder};
