use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{KeyValueStore, MemoryCache, StorageError};

pub const SETTINGS_KEY: &str = "settings.json";
const POLICY_CACHE_KEY: &str = "download_policy";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadPolicy {
    pub wifi_only: bool,
}

impl DownloadPolicy {
    /// Unreadable or foreign documents yield the default policy.
    fn from_document(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(doc) => Self {
                wifi_only: doc.get("wifiOnly").and_then(Value::as_bool).unwrap_or_default(),
            },
            Err(e) => {
                warn!("Failed to load settings: {}", e);
                Self::default()
            }
        }
    }
}

/// Download policy persisted as `{"wifiOnly": bool}` and served from memory
/// once loaded.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
    memory: MemoryCache<DownloadPolicy>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            memory: MemoryCache::new(1),
        }
    }

    /// Reads the persisted policy into memory. A missing or broken file leaves
    /// the default in place.
    pub async fn load(&self) -> DownloadPolicy {
        let policy = match self.store.get_item(SETTINGS_KEY).await {
            Ok(Some(raw)) => DownloadPolicy::from_document(&raw),
            Ok(None) => DownloadPolicy::default(),
            Err(e) => {
                warn!("Failed to read settings: {}", e);
                DownloadPolicy::default()
            }
        };

        info!("Download policy loaded: wifi_only={}", policy.wifi_only);
        self.memory.set(POLICY_CACHE_KEY, policy);
        policy
    }

    pub fn is_loaded(&self) -> bool {
        self.memory.contains(POLICY_CACHE_KEY)
    }

    pub fn policy(&self) -> DownloadPolicy {
        self.memory.get(POLICY_CACHE_KEY).unwrap_or_default()
    }

    pub fn wifi_only(&self) -> bool {
        self.policy().wifi_only
    }

    /// Updates memory first, then persists. Concurrent writers race, the last
    /// write wins.
    pub async fn set_wifi_only(&self, value: bool) -> Result<(), StorageError> {
        let policy = DownloadPolicy { wifi_only: value };
        self.memory.set(POLICY_CACHE_KEY, policy);

        let json = serde_json::to_string(&policy)?;
        self.store.set_item(SETTINGS_KEY, &json).await.inspect_err(|e| {
            warn!("Failed to persist settings: {}", e);
        })
    }
}
