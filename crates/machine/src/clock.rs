//! Process-wide simulation clock.
//!
//! A single monotonic cycle counter shared by the whole process. The cycle
//! engine advances it exactly once per completed cycle; cores and memory
//! components read it freely. It is deliberately *not* part of [`crate::machine::Machine`]:
//! component code legitimately samples the current cycle without holding a
//! machine handle.

use std::sync::atomic::{AtomicU64, Ordering};

static SIM_CYCLE: AtomicU64 = AtomicU64::new(0);

/// Returns the current simulated cycle.
pub fn cycle() -> u64 {
    SIM_CYCLE.load(Ordering::Relaxed)
}

/// Advances the clock by one cycle. Called by the cycle engine only, at the
/// end of each completed cycle.
pub(crate) fn advance() {
    let _ = SIM_CYCLE.fetch_add(1, Ordering::Relaxed);
}
