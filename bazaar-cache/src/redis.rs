//! Redis cache store.
//!
//! Shared cache over plain string keys with server-side TTL expiry.
//! Invalidation scans for keys matching a glob pattern and deletes
//! them in one round trip.
//!
//! The connection is established lazily with short timeouts: an
//! unreachable server is a degradation handled by the fallback
//! wrapper, not a construction failure.

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Redis-backed cache store.
pub struct RedisCache {
    client: Client,
    conn: RwLock<Option<ConnectionManager>>,
    /// Key prefix
    prefix: String,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl RedisCache {
    /// Create a cache for the given connection URL.
    ///
    /// Only the URL is validated here; the first command triggers the
    /// actual connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn new(url: &str) -> CacheResult<Self> {
        debug!(url = %url, "configuring redis cache store");

        let client = Client::open(url)?;

        Ok(Self {
            client,
            conn: RwLock::new(None),
            prefix: "cache".to_string(),
            connect_timeout: Duration::from_secs(1),
            response_timeout: Duration::from_secs(1),
        })
    }

    /// Set a custom key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set connect and response timeouts.
    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    /// Get the full key with prefix.
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        if let Some(conn) = self.conn.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut slot = self.conn.write().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(Some(self.connect_timeout))
            .set_response_timeout(Some(self.response_timeout))
            .set_number_of_retries(1);

        let conn = ConnectionManager::new_with_config(self.client.clone(), config).await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Drop the cached connection so the next call reconnects.
    async fn drop_connection(&self) {
        *self.conn.write().await = None;
    }

    async fn run<T>(&self, result: Result<T, redis::RedisError>) -> CacheResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                self.drop_connection().await;
                Err(CacheError::from(err))
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let result: Result<Option<String>, _> = conn.get(self.key(key)).await;
        let value = self.run(result).await?;

        trace!(key = %key, hit = value.is_some(), "redis cache get");
        Ok(value)
    }

    async fn set_json(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let result: Result<(), _> = conn.set_ex(self.key(key), value, ttl.as_secs()).await;
        self.run(result).await?;

        trace!(key = %key, ttl = ?ttl, "redis cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let result: Result<(), _> = conn.del(self.key(key)).await;
        self.run(result).await
    }

    async fn invalidate(&self, pattern: &str) -> CacheResult<u64> {
        let mut conn = self.connection().await?;

        let result: Result<Vec<String>, _> = conn.keys(self.key(pattern)).await;
        let keys = self.run(result).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let result: Result<u64, _> = conn.del(&keys).await;
        let removed = self.run(result).await?;

        debug!(pattern = %pattern, removed = removed, "redis cache invalidation");
        Ok(removed)
    }

    fn store_kind(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    // Redis tests require a running Redis instance
    // Run with: cargo test --features redis -- --ignored

    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        assert!(RedisCache::new("not a url").is_err());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_get_delete() {
        let cache = RedisCache::new("redis://localhost:6379").unwrap();

        cache.set_json("it:k", "\"v\"", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get_json("it:k").await.unwrap(), Some("\"v\"".to_string()));

        cache.delete("it:k").await.unwrap();
        assert_eq!(cache.get_json("it:k").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_invalidate_glob() {
        let cache = RedisCache::new("redis://localhost:6379").unwrap();

        cache.set_json("it:a:1", "\"a\"", Duration::from_secs(60)).await.unwrap();
        cache.set_json("it:a:2", "\"b\"", Duration::from_secs(60)).await.unwrap();
        cache.set_json("it:b:1", "\"c\"", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.invalidate("it:a:*").await.unwrap(), 2);
        assert!(cache.get_json("it:b:1").await.unwrap().is_some());

        cache.invalidate("it:*").await.unwrap();
    }
}
