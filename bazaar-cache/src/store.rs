//! Cache storage backends.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for cache storage backends.
///
/// Payloads cross this boundary as JSON strings; the typed facade in
/// the crate root handles serialization. Every entry carries a TTL and
/// is never served past it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a live entry. Expired entries read as absent.
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store an entry under a fresh TTL, replacing any previous value.
    async fn set_json(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove a single entry.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Remove all entries matching a pattern, returning how many went.
    ///
    /// Pattern matching is backend-defined: the shared store applies
    /// glob semantics, the in-process store substring containment.
    async fn invalidate(&self, pattern: &str) -> CacheResult<u64>;

    /// Store kind name for logs.
    fn store_kind(&self) -> &'static str;
}
