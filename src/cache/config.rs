use std::time::Duration;

/// Cache behavior configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL for entries inserted without an explicit TTL
    pub ttl: Duration,

    /// Maximum entries before LRU eviction kicks in
    pub max_entries: usize,
}

impl CacheConfig {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { ttl, max_entries }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_entries: 10_000,
        }
    }
}
