//! Wall-clock abstraction.
//!
//! Quota accounting and cache expiry compare floating-point epoch
//! seconds. The clock is injected rather than read ambiently so tests
//! can advance time without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time as floating-point seconds since the Unix epoch.
    fn now(&self) -> f64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64()
    }
}

/// Manually driven clock for tests.
///
/// Frozen at the given instant; only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start` epoch seconds.
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                Some((f64::from_bits(bits) + seconds).to_bits())
            });
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_past_epoch() {
        let clock = SystemClock;
        assert!(clock.now() > 0.0);
    }

    #[test]
    fn test_manual_clock_starts_frozen() {
        let clock = ManualClock::new(1_000.0);
        assert_eq!(clock.now(), 1_000.0);
        assert_eq!(clock.now(), 1_000.0);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(1_000.0);
        clock.advance(0.5);
        assert_eq!(clock.now(), 1_000.5);
        clock.advance(59.5);
        assert_eq!(clock.now(), 1_060.0);
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::new(1_000.0);
        clock.set(42.0);
        assert_eq!(clock.now(), 42.0);
    }
}
