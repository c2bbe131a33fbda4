//! In-memory table of resolved artists
//!
//! A present key with a `None` value is a negative entry: the artist was
//! looked up and nothing was found. Entries are never evicted or expired.

use crate::models::{ArtistKey, ArtistRecord};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub(crate) struct CacheTable {
    entries: RwLock<HashMap<ArtistKey, Option<ArtistRecord>>>,
}

impl CacheTable {
    // No lock is held across an await, so a poisoned lock still holds a
    // consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ArtistKey, Option<ArtistRecord>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ArtistKey, Option<ArtistRecord>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Outer `None` means never attempted
    pub fn get(&self, key: &ArtistKey) -> Option<Option<ArtistRecord>> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &ArtistKey) -> bool {
        self.read().contains_key(key)
    }

    pub fn insert(&self, key: ArtistKey, value: Option<ArtistRecord>) {
        self.write().insert(key, value);
    }

    /// Add entries for keys not already present. Returns how many were added.
    pub fn merge_missing(
        &self,
        entries: impl IntoIterator<Item = (ArtistKey, Option<ArtistRecord>)>,
    ) -> usize {
        let mut table = self.write();
        let mut added = 0;
        for (key, value) in entries {
            if let std::collections::hash_map::Entry::Vacant(slot) = table.entry(key) {
                slot.insert(value);
                added += 1;
            }
        }
        added
    }

    pub fn remove(&self, key: &ArtistKey) -> Option<Option<ArtistRecord>> {
        self.write().remove(key)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn snapshot(&self) -> HashMap<String, Option<ArtistRecord>> {
        self.read()
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value.clone()))
            .collect()
    }
}
