//! Response caching with TTL support and bounded size.
//!
//! Upstream prediction and search responses are cached per endpoint and
//! normalised input. Reads never fail: an expired or missing entry is a miss.
//!
//! # Examples
//!
//! ```no_run
//! use phone_insights_api::performance::cache::{CacheConfig, CacheKey, CacheService, InMemoryCache};
//! use phone_insights_core::TaskType;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CacheConfig::builder()
//!         .default_ttl(Duration::from_secs(300))
//!         .max_entries(1000)
//!         .build()
//!         .unwrap();
//!
//!     let cache = InMemoryCache::new(config);
//!     let key = CacheKey::prediction(TaskType::Price, "3f1c...".to_string());
//!     cache.insert(key, serde_json::json!({"price": 999})).await;
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use phone_insights_core::TaskType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while setting up a cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    ConfigurationError(String),
}

/// Which entry to drop when the cache is full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Least Recently Used
    LRU,
    /// First In First Out
    FIFO,
}

/// Configuration for the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied by `insert`.
    pub default_ttl: Duration,

    /// Maximum number of entries in the cache.
    pub max_entries: usize,

    pub eviction_policy: EvictionPolicy,

    /// Periodically sweep expired entries in the background.
    pub auto_cleanup: bool,

    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            max_entries: 10_000,
            eviction_policy: EvictionPolicy::LRU,
            auto_cleanup: true,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Builder for creating CacheConfig instances.
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
    eviction_policy: Option<EvictionPolicy>,
    auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    pub fn auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = Some(enabled);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Builds the CacheConfig.
    pub fn build(self) -> Result<CacheConfig, CacheError> {
        let default = CacheConfig::default();

        let max_entries = self.max_entries.unwrap_or(default.max_entries);
        if max_entries == 0 {
            return Err(CacheError::ConfigurationError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        let default_ttl = self.default_ttl.unwrap_or(default.default_ttl);
        if default_ttl.is_zero() {
            return Err(CacheError::ConfigurationError(
                "default_ttl must be greater than 0".to_string(),
            ));
        }

        let cleanup_interval = self.cleanup_interval.unwrap_or(default.cleanup_interval);
        if cleanup_interval.is_zero() {
            return Err(CacheError::ConfigurationError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }

        Ok(CacheConfig {
            default_ttl,
            max_entries,
            eviction_policy: self.eviction_policy.unwrap_or(default.eviction_policy),
            auto_cleanup: self.auto_cleanup.unwrap_or(default.auto_cleanup),
            cleanup_interval,
        })
    }
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Cache key namespace for upstream responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    /// A prediction, keyed by task and the input fingerprint.
    Prediction { task: TaskType, fingerprint: String },

    /// A phone search, keyed by its normalised query.
    Search(String),
}

impl CacheKey {
    pub fn prediction(task: TaskType, fingerprint: String) -> Self {
        CacheKey::Prediction { task, fingerprint }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Prediction { task, fingerprint } => {
                write!(f, "predict:{}:{}", task, fingerprint)
            }
            CacheKey::Search(identity) => write!(f, "search:{}", identity),
        }
    }
}

/// A cached value with bookkeeping for expiry and eviction.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    access_count: u64,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl_chrono = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::seconds(300));

        Self {
            value,
            created_at: now,
            expires_at: now + ttl_chrono,
            last_accessed: now,
            access_count: 0,
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    fn access(&mut self) {
        self.last_accessed = Utc::now();
        self.access_count += 1;
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries removed because their TTL ran out.
    pub expirations: u64,
    pub current_entries: usize,
    pub max_entries: usize,
    /// 0.0 - 1.0
    pub hit_rate: f64,
    pub collected_at: DateTime<Utc>,
}

impl CacheStatistics {
    fn new(max_entries: usize) -> Self {
        Self {
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
            current_entries: 0,
            max_entries,
            hit_rate: 0.0,
            collected_at: Utc::now(),
        }
    }

    fn calculate_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        self.collected_at = Utc::now();
    }
}

/// Trait for cache service implementations.
#[async_trait]
pub trait CacheService<K, V>: Send + Sync {
    /// Gets a live value; expired entries are dropped and reported as a miss.
    async fn get(&self, key: &K) -> Option<V>;

    /// Inserts (or overwrites) a value with the default TTL.
    async fn insert(&self, key: K, value: V);

    /// Inserts (or overwrites) a value with a custom TTL.
    async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration);

    async fn remove(&self, key: &K) -> Option<V>;

    /// Clears all entries from the cache.
    async fn clear(&self);

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn statistics(&self) -> CacheStatistics;
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// In-memory cache implementation using DashMap.
pub struct InMemoryCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    config: CacheConfig,
    entries: Arc<DashMap<K, CacheEntry<V>>>,
    counters: Arc<Counters>,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new in-memory cache. With `auto_cleanup` this must be called
    /// inside a Tokio runtime; the sweeper stops once the cache is dropped.
    pub fn new(config: CacheConfig) -> Self {
        let cache = Self {
            config,
            entries: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        };

        if cache.config.auto_cleanup {
            let entries = Arc::downgrade(&cache.entries);
            let counters = Arc::downgrade(&cache.counters);
            let interval = cache.config.cleanup_interval;

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if !Self::sweep(&entries, &counters) {
                        break;
                    }
                }
            });
        }

        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns false once the cache has been dropped.
    fn sweep(entries: &Weak<DashMap<K, CacheEntry<V>>>, counters: &Weak<Counters>) -> bool {
        let (Some(entries), Some(counters)) = (entries.upgrade(), counters.upgrade()) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(entries.len());

        if removed > 0 {
            counters.expirations.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "Swept expired cache entries");
        }
        true
    }

    fn evict_entry(&self) {
        let key_to_evict = match self.config.eviction_policy {
            EvictionPolicy::LRU => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().last_accessed)
                .map(|entry| entry.key().clone()),
            EvictionPolicy::FIFO => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| entry.key().clone()),
        };

        if let Some(key) = key_to_evict {
            self.entries.remove(&key);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl<K, V> CacheService<K, V> for InMemoryCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired() {
                drop(entry);
                // A fresh insert may have replaced the entry since the guard was dropped
                if self.entries.remove_if(key, |_, e| e.is_expired()).is_some() {
                    self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                }
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }

            entry.access();
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            Some(entry.value.clone())
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    async fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.config.default_ttl).await;
    }

    async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            self.evict_entry();
        }

        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    async fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    async fn clear(&self) {
        self.entries.clear();
    }

    async fn len(&self) -> usize {
        self.entries.len()
    }

    async fn statistics(&self) -> CacheStatistics {
        let mut stats = CacheStatistics::new(self.config.max_entries);
        stats.hits = self.counters.hits.load(Ordering::Relaxed);
        stats.misses = self.counters.misses.load(Ordering::Relaxed);
        stats.evictions = self.counters.evictions.load(Ordering::Relaxed);
        stats.expirations = self.counters.expirations.load(Ordering::Relaxed);
        stats.current_entries = self.entries.len();
        stats.calculate_hit_rate();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::time::sleep;

    fn manual_cache(ttl: Duration, max_entries: usize) -> InMemoryCache<CacheKey, Value> {
        let config = CacheConfig::builder()
            .default_ttl(ttl)
            .max_entries(max_entries)
            .auto_cleanup(false)
            .build()
            .unwrap();
        InMemoryCache::new(config)
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::Search(name.to_string())
    }

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.eviction_policy, EvictionPolicy::LRU);
        assert!(config.auto_cleanup);
    }

    #[test]
    fn test_cache_config_builder_validation() {
        assert!(CacheConfig::builder().max_entries(0).build().is_err());
        assert!(CacheConfig::builder().default_ttl(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::prediction(TaskType::Price, "abc".to_string());
        assert_eq!(key.to_string(), "predict:price:abc");

        assert_eq!(CacheKey::Search("pixel||".to_string()).to_string(), "search:pixel||");
    }

    #[test]
    fn test_prediction_keys_differ_by_task() {
        let price = CacheKey::prediction(TaskType::Price, "abc".to_string());
        let ram = CacheKey::prediction(TaskType::Ram, "abc".to_string());
        assert_ne!(price, ram);
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = manual_cache(Duration::from_secs(60), 100);

        cache.insert(key("a"), json!({"price": 1})).await;
        assert_eq!(cache.get(&key("a")).await, Some(json!({"price": 1})));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let cache = manual_cache(Duration::from_secs(60), 100);

        cache.insert(key("a"), json!(1)).await;
        cache.insert(key("a"), json!(2)).await;

        assert_eq!(cache.get(&key("a")).await, Some(json!(2)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_removed() {
        let cache = manual_cache(Duration::from_millis(50), 100);

        cache.insert(key("a"), json!(1)).await;
        sleep(Duration::from_millis(80)).await;

        assert_eq!(cache.get(&key("a")).await, None);
        assert_eq!(cache.len().await, 0);

        let stats = cache.statistics().await;
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let cache = manual_cache(Duration::from_secs(60), 100);

        cache.insert_with_ttl(key("short"), json!(1), Duration::from_millis(30)).await;
        cache.insert(key("long"), json!(2)).await;
        sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.get(&key("short")).await, None);
        assert_eq!(cache.get(&key("long")).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = manual_cache(Duration::from_secs(60), 100);

        cache.insert(key("a"), json!(1)).await;
        cache.insert(key("b"), json!(2)).await;

        assert_eq!(cache.remove(&key("a")).await, Some(json!(1)));
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = manual_cache(Duration::from_secs(60), 2);

        cache.insert(key("a"), json!(1)).await;
        sleep(Duration::from_millis(10)).await;
        cache.insert(key("b"), json!(2)).await;
        sleep(Duration::from_millis(10)).await;

        // Touch "a" so "b" becomes least recently used.
        cache.get(&key("a")).await;
        cache.insert(key("c"), json!(3)).await;

        assert!(cache.get(&key("a")).await.is_some());
        assert!(cache.get(&key("b")).await.is_none());
        assert!(cache.get(&key("c")).await.is_some());
        assert_eq!(cache.statistics().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_statistics() {
        let cache = manual_cache(Duration::from_secs(60), 100);

        cache.insert(key("a"), json!(1)).await;
        cache.get(&key("a")).await;
        cache.get(&key("a")).await;
        cache.get(&key("missing")).await;

        let stats = cache.statistics().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.current_entries, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_background_sweep_removes_expired() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_millis(20))
            .cleanup_interval(Duration::from_millis(30))
            .build()
            .unwrap();
        let cache: InMemoryCache<CacheKey, Value> = InMemoryCache::new(config);

        cache.insert(key("a"), json!(1)).await;
        sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.statistics().await.expirations, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_expiring_read_keeps_concurrent_fresh_insert() {
        let cache = Arc::new(manual_cache(Duration::from_secs(60), 100));

        for _ in 0..200 {
            cache
                .insert_with_ttl(key("k"), json!("stale"), Duration::from_millis(1))
                .await;
            sleep(Duration::from_millis(2)).await;

            let reader = {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get(&key("k")).await })
            };
            cache.insert(key("k"), json!("fresh")).await;
            reader.await.unwrap();

            assert_eq!(cache.get(&key("k")).await, Some(json!("fresh")));
        }
    }
}
