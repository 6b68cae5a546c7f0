use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct MemoryCache<T: Clone> {
    cache: Arc<DashMap<String, T>>,
}

impl<T: Clone> MemoryCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Arc::new(DashMap::with_capacity(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.cache.get(key).map(|value| value.value().clone())
    }

    pub fn set(&self, key: &str, value: T) {
        self.cache.insert(key.to_string(), value);
    }

    pub fn del(&self, key: &str) {
        self.cache.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_set_get_del() {
        let cache = MemoryCache::<String>::new(4);
        assert!(cache.get("a").is_none());

        cache.set("a", "1".to_string());
        assert_eq!(cache.get("a").as_deref(), Some("1"));
        assert!(cache.contains("a"));

        cache.set("a", "2".to_string());
        assert_eq!(cache.get("a").as_deref(), Some("2"));
        assert_eq!(cache.len(), 1);

        cache.del("a");
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_memory_cache_clones_share_state() {
        let cache = MemoryCache::<u32>::new(0);
        let other = cache.clone();
        other.set("k", 7);
        assert_eq!(cache.get("k"), Some(7));
    }
}
