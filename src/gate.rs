//! Concurrency Gate (§4.5): a single non-reentrant, non-blocking
//! mutual-exclusion flag.
//!
//! There is no spinning and no blocking — `try_acquire` either takes the
//! flag immediately or fails immediately, which is what lets `ingest_frame`
//! run safely from an interrupt-service context without ever stalling it.

use core::sync::atomic::{AtomicBool, Ordering};

/// A single-flag, try-only mutex with drop-on-contention semantics.
#[derive(Default)]
pub struct Gate {
    locked: AtomicBool,
}

impl Gate {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Attempts to acquire the gate. Returns `true` on success.
    ///
    /// Non-reentrant: a thread already holding the gate that calls this
    /// again will fail, matching the source semantics rather than
    /// `std::sync::Mutex`'s poisoning/blocking model.
    pub fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the gate. Calling this without holding it clears an
    /// already-clear flag, which is harmless but indicates a caller bug.
    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Reports whether the gate is currently held, without acquiring it.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}
