//! Reachability tracking for the shared store.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracks whether the primary store is believed reachable.
///
/// After a failure the primary is skipped until the cooldown elapses;
/// the next caller after that is allowed through to re-probe it. A
/// successful call clears the verdict, a failed re-probe restarts the
/// cooldown.
#[derive(Debug)]
pub struct ProbeGate {
    cooldown: Duration,
    down_since: Mutex<Option<Instant>>,
}

impl ProbeGate {
    /// Create a gate with the given re-probe cooldown.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            down_since: Mutex::new(None),
        }
    }

    /// Whether the primary should be tried right now.
    pub fn is_open(&self) -> bool {
        match *self.down_since.lock().unwrap() {
            None => true,
            Some(since) => since.elapsed() >= self.cooldown,
        }
    }

    /// Record a primary failure; starts (or restarts) the cooldown.
    pub fn mark_down(&self) {
        *self.down_since.lock().unwrap() = Some(Instant::now());
    }

    /// Record a primary success; clears the down verdict.
    pub fn mark_up(&self) {
        *self.down_since.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_until_marked_down() {
        let gate = ProbeGate::new(Duration::from_secs(30));
        assert!(gate.is_open());
        gate.mark_down();
        assert!(!gate.is_open());
    }

    #[test]
    fn test_reopens_after_cooldown() {
        let gate = ProbeGate::new(Duration::ZERO);
        gate.mark_down();
        assert!(gate.is_open());
    }

    #[test]
    fn test_mark_up_clears_verdict() {
        let gate = ProbeGate::new(Duration::from_secs(30));
        gate.mark_down();
        assert!(!gate.is_open());
        gate.mark_up();
        assert!(gate.is_open());
    }
}
