//! Redis quota store.
//!
//! Shared sliding-window accounting over a sorted set scored by
//! timestamp. The prune/count/record/refresh sequence runs as a single
//! MULTI/EXEC pipeline so concurrent requests for one identity cannot
//! interleave between steps.
//!
//! The connection is established lazily with short timeouts: an
//! unreachable server is a degradation handled by the fallback
//! wrapper, not a construction failure.

use crate::error::{QuotaResult, RateLimitError};
use crate::stores::QuotaStore;
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Redis-backed quota store.
pub struct RedisStore {
    client: Client,
    conn: RwLock<Option<ConnectionManager>>,
    /// Key prefix
    prefix: String,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl RedisStore {
    /// Create a store for the given connection URL.
    ///
    /// Only the URL is validated here; the first command triggers the
    /// actual connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn new(url: &str) -> QuotaResult<Self> {
        debug!(url = %url, "configuring redis quota store");

        let client = Client::open(url)?;

        Ok(Self {
            client,
            conn: RwLock::new(None),
            prefix: "rate_limit".to_string(),
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
    fn key(&self, identity: &str) -> String {
        format!("{}:{}", self.prefix, identity)
    }

    async fn connection(&self) -> QuotaResult<ConnectionManager> {
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
}

#[async_trait]
impl QuotaStore for RedisStore {
    async fn record_request(
        &self,
        identity: &str,
        now: f64,
        window: Duration,
    ) -> QuotaResult<u64> {
        let key = self.key(identity);
        let window_start = now - window.as_secs_f64();

        let mut conn = self.connection().await?;

        // Two requests at the same float timestamp collapse to one
        // sorted-set member; the memory log keeps both.
        let result: Result<(u64,), redis::RedisError> = redis::pipe()
            .atomic()
            .zrembyscore(&key, 0f64, window_start)
            .ignore()
            .zcard(&key)
            .zadd(&key, now.to_string(), now)
            .ignore()
            .expire(&key, window.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await;

        match result {
            Ok((count,)) => {
                trace!(identity = %identity, count = count, "recorded request in redis store");
                Ok(count)
            }
            Err(err) => {
                self.drop_connection().await;
                Err(RateLimitError::from(err))
            }
        }
    }

    async fn reset(&self, identity: &str) -> QuotaResult<()> {
        debug!(identity = %identity, "resetting quota state in redis");

        let mut conn = self.connection().await?;
        let result: Result<(), redis::RedisError> = conn.del(self.key(identity)).await;

        if let Err(err) = result {
            self.drop_connection().await;
            return Err(RateLimitError::from(err));
        }
        Ok(())
    }

    fn store_kind(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .finish()
    }
}
