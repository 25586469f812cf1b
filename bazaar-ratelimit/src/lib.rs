//! Sliding-window rate limiting for Bazaar services.
//!
//! Admission is decided from a per-client log of request timestamps:
//! entries older than the window are pruned, the survivors are counted,
//! and the request is admitted when the count is below the limit. The
//! attempt is recorded either way, so hammering a closed door keeps it
//! closed.
//!
//! Accounting lives in a shared Redis store when one is configured,
//! with a transparent in-process fallback when it is unreachable.
//! Store failures never surface to callers.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bazaar_ratelimit::{RateLimiterBuilder, RequestInfo};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = RateLimiterBuilder::new()
//!     .limit(100)
//!     .window(Duration::from_secs(60))
//!     .redis_url("redis://localhost:6379")
//!     .build()?;
//!
//! let info = RequestInfo::new().with_header("X-Forwarded-For", "203.0.113.7");
//! let decision = limiter.check_request(&info).await;
//!
//! if !decision.allowed {
//!     // respond 429 with decision.headers()
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod stores;

pub use config::{RateLimitConfig, RateLimiterBuilder};
pub use error::{QuotaHeaders, QuotaResult, RateLimitError};
pub use identity::{client_identity, RequestInfo};
pub use stores::{FallbackStore, MemoryStore, QuotaStore};

#[cfg(feature = "redis")]
pub use stores::RedisStore;

use bazaar_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a quota check.
#[derive(Debug, Clone)]
pub struct QuotaDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Requests the client may still make in this window
    pub remaining: u64,
    /// Maximum requests allowed in the window
    pub limit: u64,
    /// Unix timestamp when the window resets
    pub reset_at: i64,
    /// Time to wait before retrying (only when denied)
    pub retry_after: Option<Duration>,
}

impl QuotaDecision {
    /// Get response header metadata for this decision.
    pub fn headers(&self) -> QuotaHeaders {
        if self.allowed {
            QuotaHeaders::allowed(self.limit, self.remaining, self.reset_at)
        } else {
            QuotaHeaders::denied(
                self.limit,
                self.reset_at,
                self.retry_after.unwrap_or(Duration::ZERO).as_secs(),
            )
        }
    }
}

/// Sliding-window rate limiter.
///
/// Cheap to clone behind an `Arc` inside a service; all state lives in
/// the underlying store.
pub struct RateLimiter {
    store: FallbackStore,
    clock: Arc<dyn Clock>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub(crate) fn new(store: FallbackStore, clock: Arc<dyn Clock>, config: RateLimitConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether a client may proceed, using the configured limit
    /// and window.
    ///
    /// Never fails: a store error admits the request and logs a
    /// warning, since refusing traffic over an accounting hiccup is
    /// worse than briefly over-admitting.
    pub async fn check(&self, identity: &str) -> QuotaDecision {
        self.check_with(identity, self.config.limit, self.config.window)
            .await
    }

    /// Check with a per-call limit and window, for routes with their
    /// own quota.
    pub async fn check_with(&self, identity: &str, limit: u64, window: Duration) -> QuotaDecision {
        let now = self.clock.now();
        let reset_at = (now + window.as_secs_f64()) as i64;

        let count = match self.store.record_request(identity, now, window).await {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    identity = %identity,
                    error = %err,
                    "quota store unavailable, admitting request"
                );
                0
            }
        };

        if count >= limit {
            debug!(
                identity = %identity,
                count = count,
                limit = limit,
                "rate limit exceeded"
            );
            return QuotaDecision {
                allowed: false,
                remaining: 0,
                limit,
                reset_at,
                retry_after: Some(window),
            };
        }

        QuotaDecision {
            allowed: true,
            remaining: limit - count - 1,
            limit,
            reset_at,
            retry_after: None,
        }
    }

    /// Check a request, deriving the identity from its network origin.
    pub async fn check_request(&self, info: &RequestInfo) -> QuotaDecision {
        self.check(&client_identity(info)).await
    }

    /// Check and turn a denial into an error.
    ///
    /// Returns the headers to attach on success, or
    /// [`RateLimitError::LimitExceeded`] carrying the retry metadata.
    pub async fn enforce(&self, identity: &str) -> Result<QuotaHeaders, RateLimitError> {
        let decision = self.check(identity).await;

        if decision.allowed {
            Ok(decision.headers())
        } else {
            Err(RateLimitError::limit_exceeded(
                decision.limit,
                decision.reset_at,
                decision.retry_after.unwrap_or(self.config.window),
            ))
        }
    }

    /// Drop all recorded state for an identity.
    pub async fn reset(&self, identity: &str) -> QuotaResult<()> {
        self.store.reset(identity).await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.config.limit)
            .field("window", &self.config.window)
            .finish()
    }
}
