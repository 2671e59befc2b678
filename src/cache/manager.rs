/// In-memory cache with per-entry expiry deadlines
///
/// Read-service responses carry different freshness budgets per endpoint, so
/// every entry stores its own deadline; entries inserted without one use the
/// configured default TTL. When the map reaches capacity, expired entries are
/// purged first and only then is the least-recently-used live entry dropped,
/// picked by a generation stamp bumped on every touch. One mutex guards the
/// whole state and is never held across I/O.

use super::config::CacheConfig;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Slot<V> {
    value: V,
    expires_at: Instant,
    last_used: u64,
}

/// Counters for cache observability
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub lookups: u64,
    pub hits: u64,
    pub expired: u64,
    pub evicted: u64,
}

impl CacheStats {
    /// Share of lookups answered from the cache
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / self.lookups as f64
    }
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    /// Generation counter; a slot's `last_used` is the clock value of its
    /// most recent touch
    clock: u64,
    stats: CacheStats,
}

pub struct CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> CacheManager<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                clock: 0,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Get a live value; entries past their deadline count as misses and are
    /// dropped on the spot
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let inner = &mut *guard;
        inner.clock += 1;
        inner.stats.lookups += 1;

        let now = Instant::now();
        let live = match inner.slots.get(key) {
            None => return None,
            Some(slot) if slot.expires_at <= now => None,
            Some(slot) => Some(slot.value.clone()),
        };

        match live {
            None => {
                inner.slots.remove(key);
                inner.stats.expired += 1;
                None
            }
            Some(value) => {
                let clock = inner.clock;
                if let Some(slot) = inner.slots.get_mut(key) {
                    slot.last_used = clock;
                }
                inner.stats.hits += 1;
                Some(value)
            }
        }
    }

    /// Insert with the configured default TTL
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.config.ttl);
    }

    /// Insert with an explicit deadline of `now + ttl`
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.clock += 1;

        let now = Instant::now();
        if !inner.slots.contains_key(&key) && inner.slots.len() >= self.config.max_entries {
            Self::make_room(&mut inner, now);
        }

        let clock = inner.clock;
        inner.slots.insert(
            key,
            Slot {
                value,
                expires_at: now + ttl,
                last_used: clock,
            },
        );
    }

    /// Free one slot: purge everything past its deadline, and only if that
    /// freed nothing, drop the coldest live entry
    fn make_room(inner: &mut Inner<K, V>, now: Instant) {
        let before = inner.slots.len();
        inner.slots.retain(|_, slot| slot.expires_at > now);
        let purged = before - inner.slots.len();
        inner.stats.expired += purged as u64;
        if purged > 0 {
            return;
        }

        let coldest = inner
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = coldest {
            inner.slots.remove(&key);
            inner.stats.evicted += 1;
        }
    }

    /// Remove a specific key
    pub fn invalidate(&self, key: &K) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .slots
            .remove(key);
    }

    /// Drop everything
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .slots
            .clear();
    }

    /// Drop entries past their deadline, returning how many went
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let before = inner.slots.len();
        inner.slots.retain(|_, slot| slot.expires_at > now);
        let purged = before - inner.slots.len();
        inner.stats.expired += purged as u64;
        purged
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).stats
    }
}
