//! Limiter configuration and builder.

use crate::error::{QuotaResult, RateLimitError};
use crate::stores::{FallbackStore, QuotaStore};
use crate::RateLimiter;
use bazaar_core::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for the rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per identity per window
    pub limit: u64,
    /// Sliding window length
    pub window: Duration,
    /// Key prefix in the shared store
    pub key_prefix: String,
    /// Shared-store connection URL; `None` runs memory-only
    pub redis_url: Option<String>,
    /// Shared-store connect timeout
    pub connect_timeout: Duration,
    /// Shared-store response timeout
    pub response_timeout: Duration,
    /// How long a failed shared store is skipped before re-probing
    pub probe_cooldown: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(60),
            key_prefix: "rate_limit".to_string(),
            redis_url: None,
            connect_timeout: Duration::from_secs(1),
            response_timeout: Duration::from_secs(1),
            probe_cooldown: Duration::from_secs(30),
        }
    }
}

impl RateLimitConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }
}

/// Builder for creating a [`RateLimiter`].
pub struct RateLimiterBuilder {
    config: RateLimitConfig,
    clock: Option<Arc<dyn Clock>>,
    primary: Option<Arc<dyn QuotaStore>>,
}

impl RateLimiterBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: RateLimitConfig::default(),
            clock: None,
            primary: None,
        }
    }

    /// Set the admitted requests per window.
    pub fn limit(mut self, limit: u64) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the sliding window length.
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Use a shared Redis store at the given URL.
    #[cfg(feature = "redis")]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = Some(url.into());
        self
    }

    /// Set the key prefix for the shared store.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set shared-store connect and response timeouts.
    pub fn timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.config.connect_timeout = connect;
        self.config.response_timeout = response;
        self
    }

    /// Set the re-probe cooldown after a shared-store failure.
    pub fn probe_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.probe_cooldown = cooldown;
        self
    }

    /// Inject a clock (tests use a manual one).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Inject a primary store directly, bypassing URL construction.
    pub fn primary_store(mut self, store: Arc<dyn QuotaStore>) -> Self {
        self.primary = Some(store);
        self
    }

    /// Build the rate limiter.
    ///
    /// A malformed Redis URL is a configuration error; an unreachable
    /// server is not — the connection is established lazily and
    /// failures degrade to the in-process store.
    pub fn build(self) -> QuotaResult<RateLimiter> {
        if self.config.limit == 0 {
            return Err(RateLimitError::config("limit must be greater than 0"));
        }
        if self.config.window.is_zero() {
            return Err(RateLimitError::config("window must be non-zero"));
        }

        debug!(
            limit = self.config.limit,
            window = ?self.config.window,
            shared = self.config.redis_url.is_some() || self.primary.is_some(),
            "building rate limiter"
        );

        let primary: Option<Arc<dyn QuotaStore>> = match (self.primary, &self.config.redis_url) {
            (Some(store), _) => Some(store),
            #[cfg(feature = "redis")]
            (None, Some(url)) => Some(Arc::new(
                crate::stores::RedisStore::new(url)?
                    .with_prefix(self.config.key_prefix.clone())
                    .with_timeouts(self.config.connect_timeout, self.config.response_timeout),
            )),
            #[cfg(not(feature = "redis"))]
            (None, Some(_)) => {
                return Err(RateLimitError::config(
                    "redis feature is not enabled; add the `redis` feature to use a shared store",
                ));
            }
            (None, None) => None,
        };

        let store = FallbackStore::new(primary, self.config.probe_cooldown);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(RateLimiter::new(store, clock, self.config))
    }
}

impl Default for RateLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.limit, 100);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.key_prefix, "rate_limit");
        assert!(config.redis_url.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_builder_rejects_zero_limit() {
        let result = RateLimiterBuilder::new().limit(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_window() {
        let result = RateLimiterBuilder::new().window(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_memory_only() {
        let limiter = RateLimiterBuilder::new()
            .limit(5)
            .window(Duration::from_secs(10))
            .build()
            .unwrap();

        assert_eq!(limiter.config().limit, 5);
        assert_eq!(limiter.config().window, Duration::from_secs(10));
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_builder_rejects_malformed_url() {
        let result = RateLimiterBuilder::new().redis_url("not a url").build();
        assert!(result.is_err());
    }
}
