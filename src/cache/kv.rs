/// Process-wide KV cache for hot read-service responses
///
/// String keys, JSON string values, per-entry TTL. The config accepts a
/// remote backend URL for parity with managed deployments; only the
/// in-memory backend ships and a configured URL is logged as ignored.

use super::config::CacheConfig;
use super::manager::{CacheManager, CacheStats};
use crate::config::with_config;
use crate::logger::{self, LogTag};
use once_cell::sync::Lazy;
use std::time::Duration;

pub struct KvCache {
    inner: CacheManager<String, String>,
}

impl KvCache {
    fn new() -> Self {
        let (url, default_ttl_secs, max_entries) = with_config(|cfg| {
            (
                cfg.kv_cache.url.clone(),
                cfg.kv_cache.default_ttl_secs,
                cfg.kv_cache.max_entries,
            )
        });

        if !url.is_empty() {
            logger::warning(
                LogTag::Cache,
                &format!("kv_cache.url '{}' configured but remote backend is not supported; using in-memory cache", url),
            );
        }

        Self {
            inner: CacheManager::new(CacheConfig::new(
                Duration::from_secs(default_ttl_secs),
                max_entries,
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(&key.to_string())
    }

    pub fn set(&self, key: &str, value: String, ttl: Duration) {
        self.inner.insert_with_ttl(key.to_string(), value, ttl);
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.invalidate(&key.to_string());
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// Fetch-through helper: returns the cached JSON value or runs `load`,
    /// caching its serialized result for `ttl`
    pub async fn get_or_set_json<T, F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<T, E>
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(raw) = self.get(key) {
            if let Ok(value) = serde_json::from_str::<T>(&raw) {
                return Ok(value);
            }
            // Corrupt entry; drop it and fall through to a fresh load
            self.invalidate(key);
        }

        let value = load().await?;
        if let Ok(raw) = serde_json::to_string(&value) {
            self.set(key, raw, ttl);
        }
        Ok(value)
    }
}

static KV_CACHE: Lazy<KvCache> = Lazy::new(KvCache::new);

/// Global KV cache instance
pub fn get_kv_cache() -> &'static KvCache {
    &KV_CACHE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_set_json_caches_the_loaded_value() {
        let cache = KvCache {
            inner: CacheManager::new(CacheConfig::new(Duration::from_secs(60), 100)),
        };

        let loaded: Result<Vec<u32>, ()> = cache
            .get_or_set_json("k", Duration::from_secs(60), || async { Ok(vec![1, 2, 3]) })
            .await;
        assert_eq!(loaded.unwrap(), vec![1, 2, 3]);

        // Second call must hit the cache, not the loader
        let loaded: Result<Vec<u32>, ()> = cache
            .get_or_set_json("k", Duration::from_secs(60), || async {
                panic!("loader should not run")
            })
            .await;
        assert_eq!(loaded.unwrap(), vec![1, 2, 3]);
    }
}
