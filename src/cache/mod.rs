/// Generic cache system - reusable for token detail, OHLCV, holders, any data
///
/// Features:
/// - Per-entry expiry deadlines with a configured default TTL
/// - Generation-stamped least-recently-used eviction at capacity
/// - Thread-safe access, one mutex, never held across I/O
/// - Lookup/hit/expiry/eviction counters

pub mod config;
pub mod kv;
pub mod manager;

pub use config::CacheConfig;
pub use kv::{get_kv_cache, KvCache};
pub use manager::{CacheManager, CacheStats};
