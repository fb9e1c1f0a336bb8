// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted key-value store abstraction.

use crate::error::NudgeError;

/// Small persisted key-value store (the platform preferences analog).
///
/// Callers that can degrade gracefully (the widget queue) treat failures as
/// an empty or unchanged value; nothing in the SDK aborts on a store error.
pub trait PreferencesStore: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>, NudgeError>;

    fn set_string(&self, key: &str, value: &str) -> Result<(), NudgeError>;

    fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, NudgeError>;

    fn set_string_list(&self, key: &str, value: &[String]) -> Result<(), NudgeError>;

    fn remove(&self, key: &str) -> Result<(), NudgeError>;

    /// Wipes all SDK-owned keys. This is the only operation that clears the
    /// persisted widget queue.
    fn clear(&self) -> Result<(), NudgeError>;
}
