//! In-process cache store.
//!
//! A plain map of JSON payloads with absolute expiry times. Expired
//! entries are evicted lazily when read or swept during invalidation;
//! there is no background reaper. Consistent only within one process.
//!
//! Invalidation here is substring containment: any `*` in the pattern
//! is stripped and surviving text matched anywhere in the key. Coarser
//! than the shared store's glob, so a pattern may clear more here.

use crate::error::CacheResult;
use crate::store::CacheStore;
use async_trait::async_trait;
use bazaar_core::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

struct Entry {
    value: String,
    /// Epoch seconds after which the entry is dead
    expires_at: f64,
}

/// In-memory cache store.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Create a new in-memory cache.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a cache reading time from the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        debug!("creating in-process cache store");
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entries currently held, dead or alive (for monitoring).
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    trace!(key = %key, "memory cache hit");
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict under the write lock, rechecking in case a
        // concurrent set replaced it.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
            entries.remove(key);
        }
        trace!(key = %key, "memory cache entry expired");
        Ok(None)
    }

    async fn set_json(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let expires_at = self.clock.now() + ttl.as_secs_f64();

        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );

        trace!(key = %key, ttl = ?ttl, "memory cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> CacheResult<u64> {
        let needle = pattern.replace('*', "");
        let now = self.clock.now();

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, entry| entry.expires_at > now && !key.contains(&needle));
        let removed = (before - entries.len()) as u64;

        debug!(pattern = %pattern, removed = removed, "memory cache invalidation");
        Ok(removed)
    }

    fn store_kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::ManualClock;

    const TTL: Duration = Duration::from_secs(60);

    fn cache_at(start: f64) -> (MemoryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        (MemoryCache::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (cache, _) = cache_at(1_000.0);

        cache.set_json("k", "\"v\"", TTL).await.unwrap();
        assert_eq!(cache.get_json("k").await.unwrap(), Some("\"v\"".to_string()));
        assert_eq!(cache.get_json("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_at(1_000.0);

        cache.set_json("k", "\"v\"", Duration::from_secs(1)).await.unwrap();
        assert!(cache.get_json("k").await.unwrap().is_some());

        clock.advance(2.0);
        assert_eq!(cache.get_json("k").await.unwrap(), None);
        // The dead entry was evicted by the read.
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_set_replaces_value_and_ttl() {
        let (cache, clock) = cache_at(1_000.0);

        cache.set_json("k", "\"old\"", Duration::from_secs(1)).await.unwrap();
        cache.set_json("k", "\"new\"", Duration::from_secs(60)).await.unwrap();

        clock.advance(2.0);
        assert_eq!(cache.get_json("k").await.unwrap(), Some("\"new\"".to_string()));
    }

    #[tokio::test]
    async fn test_invalidate_matches_substring() {
        let (cache, _) = cache_at(1_000.0);

        cache.set_json("listing:1", "\"a\"", TTL).await.unwrap();
        cache.set_json("listing:2", "\"b\"", TTL).await.unwrap();
        cache.set_json("user:1", "\"c\"", TTL).await.unwrap();

        let removed = cache.invalidate("listing:*").await.unwrap();
        assert_eq!(removed, 2);

        assert_eq!(cache.get_json("listing:1").await.unwrap(), None);
        assert!(cache.get_json("user:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let (cache, _) = cache_at(1_000.0);

        cache.set_json("listing:1", "\"a\"", TTL).await.unwrap();

        assert_eq!(cache.invalidate("listing:*").await.unwrap(), 1);
        assert_eq!(cache.invalidate("listing:*").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_sweeps_expired_entries() {
        let (cache, clock) = cache_at(1_000.0);

        cache.set_json("stale", "\"a\"", Duration::from_secs(1)).await.unwrap();
        clock.advance(2.0);

        // An unrelated pattern still sweeps the dead entry out.
        cache.invalidate("other:*").await.unwrap();
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (cache, _) = cache_at(1_000.0);

        cache.set_json("k", "\"v\"", TTL).await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get_json("k").await.unwrap(), None);
    }
}
