//! Result memoization.
//!
//! A [`MemoKey`] names an operation and its arguments so that repeated
//! calls with the same arguments map to the same cache entry, and
//! [`remember`] wraps the read-compute-write cycle around it.
//!
//! Only named arguments participate in the key. Two calls that pass
//! the same value under different names, or under no name at all,
//! produce different keys or collide on the bare operation name, so
//! callers must name every argument that distinguishes results.

use crate::error::CacheResult;
use crate::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Deterministic cache key for one operation invocation.
///
/// Arguments are sorted by name, so the order they are added in does
/// not matter.
#[derive(Debug, Clone)]
pub struct MemoKey {
    operation: String,
    args: Vec<(String, String)>,
}

impl MemoKey {
    /// Start a key for the named operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
        }
    }

    /// Add a named argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.args.push((name.into(), value.to_string()));
        self
    }

    /// Render the final key string.
    pub fn build(&self) -> String {
        let mut args = self.args.clone();
        args.sort_by(|a, b| a.0.cmp(&b.0));

        let mut key = self.operation.clone();
        for (name, value) in &args {
            key.push(':');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }
}

impl fmt::Display for MemoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Read-through memoization: return the cached result or compute,
/// store, and return it.
///
/// Cache trouble on either side never fails the call; only the
/// factory's own error can.
pub async fn remember<T, E, F, Fut>(
    cache: &Cache,
    key: &MemoKey,
    ttl: Option<Duration>,
    factory: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let key = key.build();

    if let Some(hit) = cache.get::<T>(&key).await {
        trace!(key = %key, "memoized result hit");
        return Ok(hit);
    }

    let value = factory().await?;
    cache.set(&key, &value, ttl).await;
    Ok(value)
}

/// Invalidate all memoized results for an operation.
pub async fn forget(cache: &Cache, operation: &str) -> CacheResult<u64> {
    cache.invalidate(&format!("{operation}:*")).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheConfig;
    use bazaar_core::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn memory_cache() -> Cache {
        Cache::with_clock(CacheConfig::memory(), Arc::new(ManualClock::new(1_000.0))).unwrap()
    }

    #[test]
    fn test_key_sorts_args_by_name() {
        let a = MemoKey::new("list_products").arg("page", 2).arg("category", "books");
        let b = MemoKey::new("list_products").arg("category", "books").arg("page", 2);

        assert_eq!(a.build(), "list_products:category=books:page=2");
        assert_eq!(a.build(), b.build());
    }

    #[test]
    fn test_key_without_args_is_bare_operation() {
        assert_eq!(MemoKey::new("list_products").build(), "list_products");
    }

    #[test]
    fn test_distinct_args_distinct_keys() {
        let a = MemoKey::new("get_product").arg("id", 1);
        let b = MemoKey::new("get_product").arg("id", 2);
        assert_ne!(a.build(), b.build());
    }

    #[tokio::test]
    async fn test_remember_computes_once() {
        let cache = memory_cache();
        let key = MemoKey::new("get_product").arg("id", 7);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let calls = &calls;
            let result: Result<u64, std::convert::Infallible> =
                remember(&cache, &key, None, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(result.unwrap(), 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remember_propagates_factory_error() {
        let cache = memory_cache();
        let key = MemoKey::new("get_product").arg("id", 7);

        let result: Result<u64, &str> =
            remember(&cache, &key, None, || async move { Err("not found") }).await;
        assert_eq!(result.unwrap_err(), "not found");

        // A failed computation is not cached.
        let result: Result<u64, &str> =
            remember(&cache, &key, None, || async move { Ok(9) }).await;
        assert_eq!(result.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_forget_clears_operation_results() {
        let cache = memory_cache();

        let one = MemoKey::new("list_products").arg("page", 1);
        let two = MemoKey::new("list_products").arg("page", 2);
        let other = MemoKey::new("get_product").arg("id", 1);

        for key in [&one, &two, &other] {
            let _: Result<u64, std::convert::Infallible> =
                remember(&cache, key, None, || async move { Ok(1) }).await;
        }

        let removed = forget(&cache, "list_products").await.unwrap();
        assert_eq!(removed, 2);

        assert!(cache.get::<u64>(&one.build()).await.is_none());
        assert!(cache.get::<u64>(&other.build()).await.is_some());
    }
}
