//! Result caching for Bazaar services.
//!
//! Values are serialized to JSON and stored under string keys with a
//! TTL. A shared Redis store carries the entries when one is
//! configured, with a transparent in-process fallback when it is
//! unreachable. Cache trouble never fails the caller: a broken lookup
//! reads as a miss, a broken write is dropped.
//!
//! Invalidation is by key pattern. The shared store applies glob
//! semantics; the in-process store matches the pattern as a substring,
//! which can clear more than the glob would. Treat invalidation as
//! "at least everything matching".
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bazaar_cache::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Cache::new(CacheConfig::redis("redis://localhost:6379"))?;
//!
//! cache.set("listing:1", &vec!["widget"], Some(Duration::from_secs(30))).await;
//! let listing: Option<Vec<String>> = cache.get("listing:1").await;
//!
//! // A product changed: drop every listing snapshot.
//! cache.invalidate("listing:*").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod memo;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod store;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use fallback::FallbackCache;
pub use memo::{forget, remember, MemoKey};
pub use memory::MemoryCache;
pub use store::CacheStore;

#[cfg(feature = "redis")]
pub use redis::RedisCache;

use bazaar_core::{Clock, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Typed cache facade.
///
/// Handles serialization and absorbs store failures; the only fallible
/// surfaces are construction and invalidation.
pub struct Cache {
    store: FallbackCache,
    config: CacheConfig,
}

impl Cache {
    /// Create a cache from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is malformed. An
    /// unreachable server is not an error; the connection is
    /// established lazily and failures degrade to memory.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache reading time from the given clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> CacheResult<Self> {
        let primary: Option<Arc<dyn CacheStore>> = match &config.url {
            #[cfg(feature = "redis")]
            Some(url) => Some(Arc::new(
                RedisCache::new(url)?
                    .with_prefix(config.key_prefix.clone())
                    .with_timeouts(config.connect_timeout, config.response_timeout),
            )),
            #[cfg(not(feature = "redis"))]
            Some(_) => {
                return Err(CacheError::config(
                    "redis feature is not enabled; add the `redis` feature to use a shared store",
                ));
            }
            None => None,
        };

        let store = FallbackCache::new(primary, config.probe_cooldown, clock);
        Ok(Self { store, config })
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a value. Misses, expired entries, store failures, and
    /// undecodable payloads all read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.store.get_json(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %key, error = %err, "cached payload undecodable, treating as miss");
                None
            }
        }
    }

    /// Store a value under the given TTL (default TTL when `None`).
    ///
    /// Returns whether the value was stored. Serialization failures
    /// and store failures are logged, not surfaced.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key = %key, error = %err, "value not serializable, skipping cache");
                return false;
            }
        };

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        match self.store.set_json(key, &payload, ttl).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %key, error = %err, "cache write failed");
                false
            }
        }
    }

    /// Remove a single entry.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.store.delete(key).await
    }

    /// Remove all entries matching a pattern, returning how many went.
    ///
    /// The count sums both layers; it reports work done, not distinct
    /// logical entries.
    pub async fn invalidate(&self, pattern: &str) -> CacheResult<u64> {
        self.store.invalidate(pattern).await
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("key_prefix", &self.config.key_prefix)
            .field("default_ttl", &self.config.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::ManualClock;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Product {
        id: u64,
        name: String,
    }

    fn memory_cache() -> (Cache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000.0));
        let cache = Cache::with_clock(CacheConfig::memory(), clock.clone()).unwrap();
        (cache, clock)
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let (cache, _) = memory_cache();
        let product = Product {
            id: 1,
            name: "widget".to_string(),
        };

        assert!(cache.set("product:1", &product, None).await);
        assert_eq!(cache.get::<Product>("product:1").await, Some(product));
        assert_eq!(cache.get::<Product>("product:2").await, None);
    }

    #[tokio::test]
    async fn test_wrong_type_reads_as_miss() {
        let (cache, _) = memory_cache();

        cache.set("k", &"just a string", None).await;
        assert_eq!(cache.get::<Product>("k").await, None);
    }

    #[tokio::test]
    async fn test_default_ttl_applies() {
        let (cache, clock) = memory_cache();

        cache.set("k", &1u64, None).await;
        clock.advance(59.0);
        assert_eq!(cache.get::<u64>("k").await, Some(1));

        clock.advance(2.0);
        assert_eq!(cache.get::<u64>("k").await, None);
    }

    #[tokio::test]
    async fn test_explicit_ttl_overrides_default() {
        let (cache, clock) = memory_cache();

        cache.set("k", &1u64, Some(Duration::from_secs(5))).await;
        clock.advance(6.0);
        assert_eq!(cache.get::<u64>("k").await, None);
    }

    #[tokio::test]
    async fn test_delete_and_invalidate() {
        let (cache, _) = memory_cache();

        cache.set("listing:1", &1u64, None).await;
        cache.set("listing:2", &2u64, None).await;
        cache.set("user:1", &3u64, None).await;

        cache.delete("listing:1").await.unwrap();
        assert_eq!(cache.get::<u64>("listing:1").await, None);

        assert_eq!(cache.invalidate("listing:*").await.unwrap(), 1);
        assert_eq!(cache.get::<u64>("listing:2").await, None);
        assert_eq!(cache.get::<u64>("user:1").await, Some(3));
    }
}
