//! Cache configuration.

use std::time::Duration;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Shared-store connection URL; `None` runs memory-only
    pub url: Option<String>,
    /// Key prefix in the shared store
    pub key_prefix: String,
    /// TTL applied when the caller does not pick one
    pub default_ttl: Duration,
    /// Shared-store connect timeout
    pub connect_timeout: Duration,
    /// Shared-store response timeout
    pub response_timeout: Duration,
    /// How long a failed shared store is skipped before re-probing
    pub probe_cooldown: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: "cache".to_string(),
            default_ttl: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(1),
            response_timeout: Duration::from_secs(1),
            probe_cooldown: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    /// Configuration backed by a shared Redis store.
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Configuration for a purely in-process cache.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set the key prefix for the shared store.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set shared-store connect and response timeouts.
    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    /// Set the re-probe cooldown after a shared-store failure.
    pub fn with_probe_cooldown(mut self, cooldown: Duration) -> Self {
        self.probe_cooldown = cooldown;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert!(config.url.is_none());
        assert_eq!(config.key_prefix, "cache");
        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert_eq!(config.probe_cooldown, Duration::from_secs(30));
    }

    #[test]
    fn test_redis_config() {
        let config = CacheConfig::redis("redis://localhost:6379")
            .with_key_prefix("shop")
            .with_default_ttl(Duration::from_secs(120));

        assert_eq!(config.url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.key_prefix, "shop");
        assert_eq!(config.default_ttl, Duration::from_secs(120));
    }
}
