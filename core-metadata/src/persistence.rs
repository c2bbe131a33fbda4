//! Durable mirror of the artist cache
//!
//! Records are stored as camelCase JSON; a negative entry is a tombstone.
//! The "persist artist data" preference is read before every operation, so
//! toggling it never needs a restart. Store failures are logged and
//! swallowed: the in-memory table stays authoritative for this process.

use crate::error::Result;
use crate::models::{ArtistKey, ArtistRecord};
use bridge_traits::storage::{RecordStore, SettingsStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Default)]
pub(crate) struct Persistence {
    records: Option<Arc<dyn RecordStore>>,
    settings: Option<Arc<dyn SettingsStore>>,
    preference_key: String,
}

impl Persistence {
    pub fn new(
        records: Option<Arc<dyn RecordStore>>,
        settings: Option<Arc<dyn SettingsStore>>,
        preference_key: impl Into<String>,
    ) -> Self {
        Self {
            records,
            settings,
            preference_key: preference_key.into(),
        }
    }

    /// Current value of the preference. Unset or unreadable means enabled.
    pub async fn is_enabled(&self) -> bool {
        if self.records.is_none() {
            return false;
        }
        let Some(settings) = &self.settings else {
            return true;
        };

        match settings.get_bool(&self.preference_key).await {
            Ok(Some(enabled)) => enabled,
            Ok(None) => true,
            Err(e) => {
                warn!(key = %self.preference_key, error = %e, "Failed to read persistence preference");
                true
            }
        }
    }

    /// Store handle, if persistence is enabled right now
    async fn active_store(&self) -> Option<&Arc<dyn RecordStore>> {
        if self.is_enabled().await {
            self.records.as_ref()
        } else {
            None
        }
    }

    /// Load every decodable entry
    pub async fn load(&self) -> Result<Vec<(ArtistKey, Option<ArtistRecord>)>> {
        let Some(store) = &self.records else {
            return Ok(Vec::new());
        };

        let rows: HashMap<String, Option<String>> = store.get_all().await?;
        let mut entries = Vec::with_capacity(rows.len());

        for (raw_key, value) in rows {
            let key = ArtistKey::normalize(&raw_key);
            if !key.is_resolvable() {
                continue;
            }

            let record = match value {
                None => None,
                Some(json) => match serde_json::from_str::<ArtistRecord>(&json) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(key = %raw_key, error = %e, "Skipping undecodable artist record");
                        continue;
                    }
                },
            };
            entries.push((key, record));
        }

        Ok(entries)
    }

    pub async fn store(&self, key: &ArtistKey, record: Option<&ArtistRecord>) {
        let Some(store) = self.active_store().await else {
            return;
        };

        let json = match record.map(serde_json::to_string).transpose() {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize artist record");
                return;
            }
        };

        match store.put(key.as_str(), json.as_deref()).await {
            Ok(()) => debug!(key = %key, "Mirrored artist record"),
            Err(e) => warn!(key = %key, error = %e, "Failed to persist artist record"),
        }
    }

    pub async fn remove(&self, key: &ArtistKey) {
        if let Some(store) = self.active_store().await {
            if let Err(e) = store.remove(key.as_str()).await {
                warn!(key = %key, error = %e, "Failed to remove persisted artist record");
            }
        }
    }

    pub async fn clear(&self) {
        if let Some(store) = self.active_store().await {
            if let Err(e) = store.clear().await {
                warn!(error = %e, "Failed to clear persisted artist records");
            }
        }
    }
}
