// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presentation gate limiting concurrent widget visibility to one.

use std::sync::atomic::{AtomicBool, Ordering};

/// Mutual-exclusion gate over the single "a widget is active" flag.
///
/// The flag may be checked from any thread (push callbacks, platform
/// observers), so the test-and-set is a lone atomic compare-exchange with
/// no intervening work. `release` must be called exactly once per
/// successful `try_acquire`, on every exit path.
#[derive(Debug, Default)]
pub struct PresentationGate {
    active: AtomicBool,
}

impl PresentationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically transitions inactive to active. Returns whether this
    /// caller won the gate.
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns the gate to inactive.
    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn second_acquire_fails_until_release() {
        let gate = PresentationGate::new();
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert!(gate.is_active());

        gate.release();
        assert!(!gate.is_active());
        assert!(gate.try_acquire());
    }

    #[test]
    fn concurrent_acquires_grant_exactly_one() {
        let gate = Arc::new(PresentationGate::new());
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = gate.clone();
                let wins = wins.clone();
                std::thread::spawn(move || {
                    if gate.try_acquire() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(gate.is_active());
    }
}
