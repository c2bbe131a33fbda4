//! Workspace umbrella crate.
//!
//! Re-exports the artist metadata core so host applications can depend on a
//! single crate and toggle `desktop-shims` in one place.

pub use core_metadata::{
    ArtistKey, ArtistRecord, ArtistResolver, BatchReport, MetadataError, UrlRelation,
};
pub use core_runtime::config::{CoreConfig, MetadataApiConfig};
pub use core_runtime::events::{ArtistEvent, CoreEvent, EventBus, SourceEvent};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_service::{CoreDependencies, CoreError, CoreService};
