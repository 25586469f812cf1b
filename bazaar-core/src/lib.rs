//! Shared primitives for the bazaar service crates.
//!
//! The quota tracker and the result cache both reason about time as
//! floating-point epoch seconds and both degrade from a shared Redis
//! store to process-local memory. This crate holds the two pieces they
//! have in common: the injectable [`Clock`] and the [`ProbeGate`] that
//! tracks whether the shared store is worth trying.

pub mod clock;
pub mod probe;

pub use clock::{Clock, ManualClock, SystemClock};
pub use probe::ProbeGate;
