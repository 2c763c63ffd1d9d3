//! Single-writer guard for `transmit_audio`.

use std::sync::atomic::{AtomicBool, Ordering};

/// Held by `transmit_audio` for the duration of a PCM stream. Dropping (by
/// any exit path: end of stream, error, or cancellation) releases the slot.
pub struct PendingTransmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PendingTransmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Asserts that at most one caller is feeding PCM into a session at a time.
#[derive(Default)]
pub struct PendingTransmission {
    flag: AtomicBool,
}

impl PendingTransmission {
    pub fn new() -> Self {
        Self { flag: AtomicBool::new(false) }
    }

    /// Claims the slot, or returns `None` if another transmission is
    /// already in flight.
    pub fn acquire(&self) -> Option<PendingTransmissionGuard<'_>> {
        self.flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PendingTransmissionGuard { flag: &self.flag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_first_guard_lives() {
        let pending = PendingTransmission::new();
        let first = pending.acquire();
        assert!(first.is_some());
        assert!(pending.acquire().is_none());
    }

    #[test]
    fn dropping_guard_releases_the_slot() {
        let pending = PendingTransmission::new();
        {
            let _guard = pending.acquire().unwrap();
        }
        assert!(pending.acquire().is_some());
    }
}
