//! Primary-else-memory cache composition.
//!
//! Wraps an optional shared cache and an always-present in-process
//! cache behind one [`CacheStore`]. Shared-store failures are logged
//! and absorbed: reads fall through to memory, writes land in memory,
//! and the primary is re-probed once its cooldown elapses. Entries
//! written during an outage are visible only to this process.

use crate::error::CacheResult;
use crate::memory::MemoryCache;
use crate::store::CacheStore;
use async_trait::async_trait;
use bazaar_core::{Clock, ProbeGate};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Cache store with transparent in-process fallback.
pub struct FallbackCache {
    primary: Option<Arc<dyn CacheStore>>,
    fallback: MemoryCache,
    gate: ProbeGate,
}

impl FallbackCache {
    /// Compose a primary cache with the in-process fallback.
    pub fn new(
        primary: Option<Arc<dyn CacheStore>>,
        probe_cooldown: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            primary,
            fallback: MemoryCache::with_clock(clock),
            gate: ProbeGate::new(probe_cooldown),
        }
    }

    /// Cache for single-process deployments: no shared backend at all.
    pub fn memory_only(clock: Arc<dyn Clock>) -> Self {
        Self::new(None, Duration::ZERO, clock)
    }

    fn usable_primary(&self) -> Option<&Arc<dyn CacheStore>> {
        self.primary.as_ref().filter(|_| self.gate.is_open())
    }

    fn note_failure(&self, primary: &Arc<dyn CacheStore>, op: &str, err: &crate::CacheError) {
        warn!(
            store = primary.store_kind(),
            op = op,
            error = %err,
            "shared cache unavailable, using in-process fallback"
        );
        self.gate.mark_down();
    }
}

#[async_trait]
impl CacheStore for FallbackCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        if let Some(primary) = self.usable_primary() {
            match primary.get_json(key).await {
                Ok(Some(value)) => {
                    self.gate.mark_up();
                    return Ok(Some(value));
                }
                Ok(None) => {
                    self.gate.mark_up();
                    // A shared miss may still be a local hit for
                    // entries written during an outage.
                }
                Err(err) => self.note_failure(primary, "get", &err),
            }
        }

        self.fallback.get_json(key).await
    }

    async fn set_json(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        if let Some(primary) = self.usable_primary() {
            match primary.set_json(key, value, ttl).await {
                Ok(()) => {
                    self.gate.mark_up();
                    return Ok(());
                }
                Err(err) => self.note_failure(primary, "set", &err),
            }
        }

        self.fallback.set_json(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        if let Some(primary) = self.usable_primary() {
            match primary.delete(key).await {
                Ok(()) => self.gate.mark_up(),
                Err(err) => self.note_failure(primary, "delete", &err),
            }
        }

        self.fallback.delete(key).await
    }

    async fn invalidate(&self, pattern: &str) -> CacheResult<u64> {
        // Both layers are swept so stale local entries cannot outlive
        // an invalidation; the counts are summed.
        let mut removed = 0;

        if let Some(primary) = self.usable_primary() {
            match primary.invalidate(pattern).await {
                Ok(count) => {
                    self.gate.mark_up();
                    removed += count;
                }
                Err(err) => self.note_failure(primary, "invalidate", &err),
            }
        }

        removed += self.fallback.invalidate(pattern).await?;
        Ok(removed)
    }

    fn store_kind(&self) -> &'static str {
        "fallback"
    }
}
