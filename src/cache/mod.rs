// Best-effort TTL cache behind an injected port
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::CacheConfig;

/// Process-local cache interface. Everything is best-effort: a miss, an
/// expired entry, and a disabled cache all look the same to callers, who
/// must fall through to the store.
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Option<Value>;
    async fn set(&self, namespace: &str, key: &str, value: Value, ttl: Duration);
    async fn delete(&self, namespace: &str, key: &str);
}

/// Build the cache implementation selected by configuration.
pub fn cache_from_config(config: &CacheConfig) -> Arc<dyn CachePort> {
    if config.enabled {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(NullCache)
    }
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-memory TTL map. Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(namespace: &str, key: &str) -> String {
        format!("{}:{}", namespace, key)
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let cache_key = Self::cache_key(namespace, key);
        {
            let entries = self.entries.read().await;
            match entries.get(&cache_key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {} // expired, clean up below
                None => return None,
            }
        }
        self.entries.write().await.remove(&cache_key);
        None
    }

    async fn set(&self, namespace: &str, key: &str, value: Value, ttl: Duration) {
        let entry = Entry { value, expires_at: Instant::now() + ttl };
        self.entries
            .write()
            .await
            .insert(Self::cache_key(namespace, key), entry);
    }

    async fn delete(&self, namespace: &str, key: &str) {
        self.entries
            .write()
            .await
            .remove(&Self::cache_key(namespace, key));
    }
}

/// Disabled cache: never stores, never hits.
pub struct NullCache;

#[async_trait]
impl CachePort for NullCache {
    async fn get(&self, _namespace: &str, _key: &str) -> Option<Value> {
        None
    }

    async fn set(&self, _namespace: &str, _key: &str, _value: Value, _ttl: Duration) {}

    async fn delete(&self, _namespace: &str, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = MemoryCache::new();
        cache.set("users", "42", json!({"name": "jo"}), Duration::from_secs(60)).await;
        assert_eq!(cache.get("users", "42").await, Some(json!({"name": "jo"})));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let cache = MemoryCache::new();
        cache.set("users", "1", json!("a"), Duration::from_secs(60)).await;
        cache.set("profiles", "1", json!("b"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("users", "1").await, Some(json!("a")));
        assert_eq!(cache.get("profiles", "1").await, Some(json!("b")));
        cache.delete("users", "1").await;
        assert_eq!(cache.get("users", "1").await, None);
        assert_eq!(cache.get("profiles", "1").await, Some(json!("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache.set("users", "1", json!("a"), Duration::from_secs(5)).await;
        assert_eq!(cache.get("users", "1").await, Some(json!("a")));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get("users", "1").await, None);
    }

    #[tokio::test]
    async fn test_null_cache_never_hits() {
        let cache = NullCache;
        cache.set("users", "1", json!("a"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("users", "1").await, None);
    }

    #[tokio::test]
    async fn test_config_selects_implementation() {
        let enabled = cache_from_config(&CacheConfig { enabled: true, user_ttl_secs: 60 });
        enabled.set("n", "k", json!(1), Duration::from_secs(60)).await;
        assert_eq!(enabled.get("n", "k").await, Some(json!(1)));

        let disabled = cache_from_config(&CacheConfig { enabled: false, user_ttl_secs: 60 });
        disabled.set("n", "k", json!(1), Duration::from_secs(60)).await;
        assert_eq!(disabled.get("n", "k").await, None);
    }
}
