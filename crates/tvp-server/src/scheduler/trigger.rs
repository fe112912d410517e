//! Single-slot manual refresh signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-provider "refresh now" flag.
///
/// Any number of callers may [`set`](Self::set) it; the scheduler loop
/// consumes it with [`take`](Self::take), which checks and clears in one
/// atomic step. Setting an already-set trigger is a no-op, so bursts of
/// requests collapse into a single refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshTrigger(Arc<AtomicBool>);

impl RefreshTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear the trigger, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
