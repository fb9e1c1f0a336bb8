// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock presentation surface.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use nudge_core::{NudgeError, PresentationSurface};

/// A mock [`PresentationSurface`] counting presents and dismissals.
pub struct MockSurface {
    available: AtomicBool,
    fail_present: Mutex<Option<String>>,
    presents: AtomicUsize,
    dismissals: AtomicUsize,
}

impl Default for MockSurface {
    fn default() -> Self {
        Self {
            available: AtomicBool::new(true),
            fail_present: Mutex::new(None),
            presents: AtomicUsize::new(0),
            dismissals: AtomicUsize::new(0),
        }
    }
}

impl MockSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the key window disappearing.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes `present()` fail with a layout error.
    pub fn fail_present(&self, message: &str) {
        *self.fail_present.lock().expect("mock poisoned") = Some(message.to_string());
    }

    pub fn present_count(&self) -> usize {
        self.presents.load(Ordering::SeqCst)
    }

    pub fn dismiss_count(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresentationSurface for MockSurface {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn present(&self) -> Result<(), NudgeError> {
        if let Some(message) = self.fail_present.lock().expect("mock poisoned").clone() {
            return Err(NudgeError::LayoutFailed { message });
        }
        self.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dismiss(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }
}
