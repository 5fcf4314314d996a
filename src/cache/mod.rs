//! Compiled-query cache.
//!
//! An LRU cache over fully-compiled statements, keyed by normalized query
//! text, so repeated executions of the same EQL skip parsing, semantic
//! analysis, lowering, and rendering. Only complete compilations are ever
//! inserted; a failed compilation publishes nothing.
//!
//! # Configuration
//!
//! Environment variables:
//! - `RELMAP_QUERY_CACHE_ENABLED` (default: true)
//! - `RELMAP_QUERY_CACHE_MAX_ENTRIES` (default: 1000)

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod keys;

pub use keys::{
    CacheKeyError, CacheRegionProvider, CollectionCacheKey, EntityCacheKey, NaturalIdCacheKey,
    SecondLevelCacheKey,
};

/// Key for compiled-query lookup: the whitespace-normalized statement text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterpretationCacheKey {
    pub normalized_query: String,
}

impl InterpretationCacheKey {
    pub fn new(query: &str) -> Self {
        let normalized = query.split_whitespace().collect::<Vec<&str>>().join(" ");
        InterpretationCacheKey {
            normalized_query: normalized,
        }
    }

    /// Short stable fingerprint of the normalized text, for log lines.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(self.normalized_query.as_bytes());
        hex::encode(&digest[..8])
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    last_accessed: u64,
    access_count: u64,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        CacheEntry {
            value,
            last_accessed: current_timestamp(),
            access_count: 0,
        }
    }

    fn touch(&mut self) {
        self.last_accessed = current_timestamp();
        self.access_count += 1;
    }
}

#[derive(Debug, Clone)]
pub struct InterpretationCacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for InterpretationCacheConfig {
    fn default() -> Self {
        InterpretationCacheConfig {
            enabled: true,
            max_entries: 1000,
        }
    }
}

impl InterpretationCacheConfig {
    pub fn from_env() -> Self {
        let enabled = std::env::var("RELMAP_QUERY_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);
        let max_entries = std::env::var("RELMAP_QUERY_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        InterpretationCacheConfig {
            enabled,
            max_entries,
        }
    }
}

/// Shared, read-mostly compiled-query cache: lock-free metrics, interior
/// locking around the map with populate-after-success semantics. Readers
/// from concurrent executions share one instance.
pub struct InterpretationCache<V: Clone> {
    cache: Mutex<HashMap<InterpretationCacheKey, CacheEntry<V>>>,
    config: InterpretationCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> InterpretationCache<V> {
    pub fn new(config: InterpretationCacheConfig) -> Self {
        InterpretationCache {
            cache: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(InterpretationCacheConfig::default())
    }

    pub fn from_env() -> Self {
        Self::new(InterpretationCacheConfig::from_env())
    }

    pub fn get(&self, key: &InterpretationCacheKey) -> Option<V> {
        if !self.config.enabled {
            return None;
        }
        let mut cache = self.cache.lock().unwrap();
        if let Some(entry) = cache.get_mut(key) {
            entry.touch();
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(entry.value.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert a fully-compiled value. May evict the least recently used
    /// entry. Callers only insert after a compilation succeeded end to end.
    pub fn insert(&self, key: InterpretationCacheKey, value: V) {
        if !self.config.enabled {
            return;
        }
        let mut cache = self.cache.lock().unwrap();
        if cache.len() >= self.config.max_entries && !cache.contains_key(&key) {
            self.evict_lru(&mut cache);
        }
        cache.insert(key, CacheEntry::new(value));
    }

    fn evict_lru(&self, cache: &mut HashMap<InterpretationCacheKey, CacheEntry<V>>) {
        if let Some((key, _)) = cache.iter().min_by_key(|(_, entry)| entry.last_accessed) {
            let key = key.clone();
            cache.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap();
        cache.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        let cache = self.cache.lock().unwrap();
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: cache.len(),
            max_entries: self.config.max_entries,
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_entries: usize,
}

impl CacheMetrics {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Current timestamp in seconds since the Unix epoch, for LRU ordering.
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
