//! "Resolve all" over a list of names

use crate::models::ArtistKey;
use crate::resolver::ArtistResolver;
use std::collections::HashSet;
use tracing::{debug, info};

/// Counters from [`ArtistResolver::resolve_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Unique resolvable names in the input
    pub requested: usize,
    /// Already cached before the batch reached them
    pub skipped: usize,
    /// Resolved by this batch
    pub resolved: usize,
    /// Resolutions that produced a record
    pub found: usize,
}

impl ArtistResolver {
    /// Resolve every name not already cached, one at a time.
    ///
    /// Names are deduplicated by key in first-seen order. The rate gate in
    /// [`resolve`](ArtistResolver::resolve) is the only throttle.
    pub async fn resolve_all<I, S>(&self, names: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for name in names {
            let name = name.as_ref();
            if let Some(key) = ArtistKey::parse(name) {
                if seen.insert(key.clone()) {
                    pending.push((key, name.trim().to_string()));
                }
            }
        }

        let mut report = BatchReport {
            requested: pending.len(),
            ..BatchReport::default()
        };

        for (key, name) in pending {
            if self.is_cached(&key) {
                report.skipped += 1;
                continue;
            }

            let found = self.resolve(&name).await.is_some();
            report.resolved += 1;
            if found {
                report.found += 1;
            }
            debug!(key = %key, found, "Batch resolved artist");
        }

        info!(
            requested = report.requested,
            skipped = report.skipped,
            resolved = report.resolved,
            found = report.found,
            "Batch artist resolution completed"
        );

        report
    }
}
