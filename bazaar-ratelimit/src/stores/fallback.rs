//! Primary-else-memory store composition.
//!
//! Wraps an optional shared store and an always-present in-process
//! store behind one [`QuotaStore`]. Shared-store failures are logged
//! and absorbed: accounting continues in process-local memory, and the
//! primary is re-probed once its cooldown elapses. During an outage
//! each process instance enforces its own quota independently.

use crate::error::QuotaResult;
use crate::stores::{MemoryStore, QuotaStore};
use async_trait::async_trait;
use bazaar_core::ProbeGate;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Quota store with transparent in-process fallback.
pub struct FallbackStore {
    primary: Option<Arc<dyn QuotaStore>>,
    fallback: MemoryStore,
    gate: ProbeGate,
}

impl FallbackStore {
    /// Compose a primary store with the in-process fallback.
    pub fn new(primary: Option<Arc<dyn QuotaStore>>, probe_cooldown: Duration) -> Self {
        Self {
            primary,
            fallback: MemoryStore::new(),
            gate: ProbeGate::new(probe_cooldown),
        }
    }

    /// Store for single-process deployments: no shared backend at all.
    pub fn memory_only() -> Self {
        Self::new(None, Duration::ZERO)
    }

    fn usable_primary(&self) -> Option<&Arc<dyn QuotaStore>> {
        self.primary.as_ref().filter(|_| self.gate.is_open())
    }
}

#[async_trait]
impl QuotaStore for FallbackStore {
    async fn record_request(
        &self,
        identity: &str,
        now: f64,
        window: Duration,
    ) -> QuotaResult<u64> {
        if let Some(primary) = self.usable_primary() {
            match primary.record_request(identity, now, window).await {
                Ok(count) => {
                    self.gate.mark_up();
                    return Ok(count);
                }
                Err(err) => {
                    warn!(
                        store = primary.store_kind(),
                        error = %err,
                        "shared quota store unavailable, using in-process fallback"
                    );
                    self.gate.mark_down();
                }
            }
        }

        self.fallback.record_request(identity, now, window).await
    }

    async fn reset(&self, identity: &str) -> QuotaResult<()> {
        if let Some(primary) = self.usable_primary() {
            if let Err(err) = primary.reset(identity).await {
                warn!(
                    store = primary.store_kind(),
                    error = %err,
                    "shared quota store unavailable, resetting in-process state only"
                );
                self.gate.mark_down();
            }
        }

        self.fallback.reset(identity).await
    }

    fn store_kind(&self) -> &'static str {
        "fallback"
    }
}
