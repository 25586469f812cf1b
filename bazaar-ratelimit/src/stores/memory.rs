//! In-process quota store.
//!
//! Keeps a per-identity log of request timestamps in a DashMap; shard
//! locks serialize concurrent requests for the same identity. Expired
//! entries are pruned lazily on each access, so no background sweeper
//! is needed. Consistent only within one process.

use crate::error::QuotaResult;
use crate::stores::QuotaStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, trace};

/// In-memory quota store.
pub struct MemoryStore {
    /// Request timestamps per identity, oldest first
    logs: DashMap<String, VecDeque<f64>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        debug!("creating in-process quota store");
        Self {
            logs: DashMap::new(),
        }
    }

    /// Number of identities currently tracked (for monitoring).
    pub fn identity_count(&self) -> usize {
        self.logs.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuotaStore for MemoryStore {
    async fn record_request(
        &self,
        identity: &str,
        now: f64,
        window: Duration,
    ) -> QuotaResult<u64> {
        let window_start = now - window.as_secs_f64();

        let mut entry = self.logs.entry(identity.to_string()).or_default();

        // Timestamps at or before the window start are expired.
        while let Some(&front) = entry.front() {
            if front <= window_start {
                entry.pop_front();
            } else {
                break;
            }
        }

        let count = entry.len() as u64;
        entry.push_back(now);

        trace!(identity = %identity, count = count, "recorded request in memory store");
        Ok(count)
    }

    async fn reset(&self, identity: &str) -> QuotaResult<()> {
        debug!(identity = %identity, "resetting quota state");
        self.logs.remove(identity);
        Ok(())
    }

    fn store_kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_counts_requests_in_window() {
        let store = MemoryStore::new();

        for expected in 0..3 {
            let count = store.record_request("client", 1_000.0, WINDOW).await.unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test]
    async fn test_prunes_expired_timestamps() {
        let store = MemoryStore::new();

        store.record_request("client", 1_000.0, WINDOW).await.unwrap();
        store.record_request("client", 1_010.0, WINDOW).await.unwrap();

        // 61 seconds after the first request: only the second survives.
        let count = store.record_request("client", 1_061.0, WINDOW).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_boundary_timestamp_is_expired() {
        let store = MemoryStore::new();

        store.record_request("client", 1_000.0, WINDOW).await.unwrap();

        // Exactly window seconds later the first entry sits on the
        // boundary and no longer counts.
        let count = store.record_request("client", 1_060.0, WINDOW).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_identical_timestamps_both_retained() {
        let store = MemoryStore::new();

        let first = store.record_request("client", 1_000.0, WINDOW).await.unwrap();
        let second = store.record_request("client", 1_000.0, WINDOW).await.unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let store = MemoryStore::new();

        store.record_request("a", 1_000.0, WINDOW).await.unwrap();
        store.record_request("a", 1_000.0, WINDOW).await.unwrap();

        let count = store.record_request("b", 1_000.0, WINDOW).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let store = MemoryStore::new();

        store.record_request("client", 1_000.0, WINDOW).await.unwrap();
        store.record_request("client", 1_000.0, WINDOW).await.unwrap();
        assert_eq!(store.identity_count(), 1);

        store.reset("client").await.unwrap();
        assert_eq!(store.identity_count(), 0);

        let count = store.record_request("client", 1_000.0, WINDOW).await.unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_store_kind() {
        assert_eq!(MemoryStore::new().store_kind(), "memory");
    }
}
