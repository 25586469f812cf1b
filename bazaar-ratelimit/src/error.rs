//! Error types for quota tracking.

use std::time::Duration;
use thiserror::Error;

/// Result type for quota store operations.
pub type QuotaResult<T> = Result<T, RateLimitError>;

/// Rate limiting errors.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The client exhausted its quota for the current window.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    LimitExceeded {
        /// Maximum requests allowed in the window
        limit: u64,
        /// When the window resets (Unix timestamp in seconds)
        reset_at: i64,
        /// Time to wait before retrying
        retry_after: Duration,
    },

    /// Shared-store failure; absorbed by the fallback wrapper.
    #[error("quota store error: {0}")]
    Store(String),

    /// Invalid limiter configuration.
    #[error("rate limit configuration error: {0}")]
    Config(String),

    /// Redis client error
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RateLimitError {
    /// Create a new store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a limit exceeded error.
    pub fn limit_exceeded(limit: u64, reset_at: i64, retry_after: Duration) -> Self {
        Self::LimitExceeded {
            limit,
            reset_at,
            retry_after,
        }
    }

    /// Check if this error is a quota-exhausted outcome.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }

    /// Get the retry-after duration if this is a limit exceeded error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::LimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Get response header metadata for a quota-exhausted outcome.
    pub fn headers(&self) -> Option<QuotaHeaders> {
        match self {
            Self::LimitExceeded {
                limit,
                reset_at,
                retry_after,
            } => Some(QuotaHeaders::denied(
                *limit,
                *reset_at,
                retry_after.as_secs(),
            )),
            _ => None,
        }
    }
}

/// Standard rate limit response metadata.
#[derive(Debug, Clone)]
pub struct QuotaHeaders {
    /// X-RateLimit-Limit: maximum requests allowed
    pub limit: u64,
    /// X-RateLimit-Remaining: requests remaining in the current window
    pub remaining: u64,
    /// X-RateLimit-Reset: Unix timestamp when the window resets
    pub reset: i64,
    /// Retry-After: seconds until the client should retry (only when denied)
    pub retry_after: Option<u64>,
}

impl QuotaHeaders {
    /// Create headers for an admitted request.
    pub fn allowed(limit: u64, remaining: u64, reset: i64) -> Self {
        Self {
            limit,
            remaining,
            reset,
            retry_after: None,
        }
    }

    /// Create headers for a denied request.
    pub fn denied(limit: u64, reset: i64, retry_after: u64) -> Self {
        Self {
            limit,
            remaining: 0,
            reset,
            retry_after: Some(retry_after),
        }
    }

    /// Get header name/value pairs.
    pub fn to_header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset.to_string()),
        ];

        if let Some(retry) = self.retry_after {
            headers.push(("Retry-After", retry.to_string()));
        }

        headers
    }
}
