use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::{KeyValueStore, MemoryCache, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Memory,
    Persistent,
    Both,
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub cache_type: CacheType,
    pub prefix: Option<String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Both,
            prefix: None,
        }
    }
}

/// In-memory cache in front of a persistent key-value store. Values are kept
/// as JSON text in both layers.
#[derive(Clone)]
pub struct CacheManager {
    memory: MemoryCache<String>,
    store: Arc<dyn KeyValueStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn KeyValueStore>, memory_capacity: usize) -> Self {
        info!("Initializing cache manager with memory capacity: {}", memory_capacity);
        Self {
            memory: MemoryCache::new(memory_capacity),
            store,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str, options: &CacheOptions) -> Result<Option<T>, StorageError> {
        match self.get_raw(key, options).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        options: &CacheOptions,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, options).await
    }

    /// Reads the stored text as-is, for values that are not JSON documents.
    pub async fn get_raw(&self, key: &str, options: &CacheOptions) -> Result<Option<String>, StorageError> {
        let key = self.build_key(key, options);

        match options.cache_type {
            CacheType::Memory => Ok(self.memory.get(&key)),
            CacheType::Persistent => self.store.get_item(&key).await,
            CacheType::Both => {
                if let Some(value) = self.memory.get(&key) {
                    return Ok(Some(value));
                }

                let value = self.store.get_item(&key).await?;
                if let Some(ref value) = value {
                    self.memory.set(&key, value.clone());
                }
                Ok(value)
            }
        }
    }

    pub async fn set_raw(&self, key: &str, value: &str, options: &CacheOptions) -> Result<(), StorageError> {
        let key = self.build_key(key, options);

        match options.cache_type {
            CacheType::Memory => {
                self.memory.set(&key, value.to_string());
                Ok(())
            }
            CacheType::Persistent => self.store.set_item(&key, value).await,
            CacheType::Both => {
                // memory first: readers observe the new value even if the write below fails
                self.memory.set(&key, value.to_string());
                self.store.set_item(&key, value).await
            }
        }
    }

    pub async fn del(&self, key: &str, options: &CacheOptions) -> Result<(), StorageError> {
        let key = self.build_key(key, options);

        match options.cache_type {
            CacheType::Memory => {
                self.memory.del(&key);
                Ok(())
            }
            CacheType::Persistent => self.store.remove_item(&key).await,
            CacheType::Both => {
                self.memory.del(&key);
                self.store.remove_item(&key).await
            }
        }
    }

    fn build_key(&self, key: &str, options: &CacheOptions) -> String {
        if let Some(ref prefix) = options.prefix {
            format!("{}_{}", prefix, key)
        } else {
            key.to_string()
        }
    }
}
