/*
 * sync.rs
 *
 * One-shot latch for "the primary timeout has fired".
 *
 * Single owner: only the supervisor thread raises or reads it. The CAS
 * makes "decide once" hold structurally, so a second fire() is a no-op
 * and returns false. Later steps (a forward after the deadline) read it
 * to tell which side of the decision they are on.
 */

use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that can be raised once and never lowered.
#[derive(Debug, Default)]
pub struct Latch {
    fired: AtomicBool,
}

impl Latch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Raise the latch. Returns true only for the caller that raised it.
    pub fn fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
