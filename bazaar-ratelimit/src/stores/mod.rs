//! Quota storage backends.
//!
//! This module provides the storage backends for quota accounting:
//!
//! - **Memory**: process-local sliding-window log (DashMap), always available
//! - **Redis**: shared sorted-set accounting for multi-instance deployments
//! - **Fallback**: primary-else-memory composition used by the limiter

mod fallback;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use fallback::FallbackStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis::RedisStore;

use crate::error::QuotaResult;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for quota storage backends.
///
/// A store keeps, per identity, the timestamps of recent requests.
/// One call prunes entries at or before `now - window`, counts what is
/// left, and records `now`. The attempt is recorded whether or not the
/// caller ends up admitted.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Prune, count, and record in one step.
    ///
    /// Returns the number of requests already inside the window, not
    /// counting the one being recorded.
    async fn record_request(&self, identity: &str, now: f64, window: Duration)
    -> QuotaResult<u64>;

    /// Drop all recorded state for an identity.
    async fn reset(&self, identity: &str) -> QuotaResult<()>;

    /// Store kind name for logs.
    fn store_kind(&self) -> &'static str;
}
