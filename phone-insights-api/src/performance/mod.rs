//! Caching of upstream responses.
//!
//! ```no_run
//! use phone_insights_api::performance::{CacheConfig, CacheService, InMemoryCache, CacheKey};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CacheConfig::builder()
//!         .default_ttl(Duration::from_secs(300))
//!         .max_entries(10000)
//!         .build()
//!         .unwrap();
//!
//!     let cache = InMemoryCache::new(config);
//!     cache.insert(CacheKey::Search("pixel||".into()), serde_json::json!(1)).await;
//!
//!     let stats = cache.statistics().await;
//!     println!("Cache hit rate: {:.2}%", stats.hit_rate * 100.0);
//! }
//! ```

pub mod cache;

pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheError, CacheKey, CacheService, CacheStatistics,
    EvictionPolicy, InMemoryCache,
};
