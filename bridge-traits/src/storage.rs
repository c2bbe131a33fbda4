//! Storage Abstractions
//!
//! Provides platform-agnostic traits for durable key-value records and
//! typed user preferences.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// Durable string-keyed record store
///
/// Values are opaque serialized payloads. A stored `None` is a tombstone: the
/// key is known, but its value is explicitly empty. Callers that need typed
/// records serialize them before calling [`put`](RecordStore::put).
///
/// The store makes no transactional guarantees across keys. Concurrent writes
/// to the same key are resolved by whichever completes last.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::RecordStore;
///
/// async fn remember(store: &dyn RecordStore) -> Result<()> {
///     store.put("radiohead", Some(r#"{"name":"Radiohead"}"#)).await?;
///     store.put("nobody", None).await?;
///     let all = store.get_all().await?;
///     assert_eq!(all.get("nobody"), Some(&None));
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load every stored entry
    async fn get_all(&self) -> Result<HashMap<String, Option<String>>>;

    /// Insert or overwrite an entry
    async fn put(&self, key: &str, value: Option<&str>) -> Result<()>;

    /// Remove an entry; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove all entries
    async fn clear(&self) -> Result<()>;
}

/// Settings storage trait
///
/// Key-value storage for user preferences.
///
/// Platform implementations:
/// - **Desktop**: SQLite database
/// - **iOS**: UserDefaults
/// - **Android**: DataStore/SharedPreferences
/// - **Web**: localStorage
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryRecords {
        rows: Mutex<HashMap<String, Option<String>>>,
    }

    #[async_trait]
    impl RecordStore for MemoryRecords {
        async fn get_all(&self) -> Result<HashMap<String, Option<String>>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(key.to_string(), value.map(str::to_string));
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.rows.lock().unwrap().remove(key);
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            self.rows.lock().unwrap().clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_store_tombstones_are_distinct_from_absence() {
        let store: Box<dyn RecordStore> = Box::new(MemoryRecords::default());

        store.put("bjork", Some("{}")).await.unwrap();
        store.put("nobody", None).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.get("bjork"), Some(&Some("{}".to_string())));
        assert_eq!(all.get("nobody"), Some(&None));
        assert_eq!(all.get("missing"), None);

        store.remove("missing").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
