mod cache;
mod error;
mod file;
mod memory;

pub use cache::{CacheManager, CacheOptions, CacheType};
pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryCache;

use async_trait::async_trait;

/// String key-value persistence, shaped after the platform key-value APIs
/// (`getItem` / `setItem` / `removeItem`).
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Volatile store, used when nothing should outlive the process.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    inner: MemoryCache<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(0),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.get(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.del(key);
        Ok(())
    }
}
