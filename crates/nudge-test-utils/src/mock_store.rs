// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory preferences store with injectable failures.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use nudge_core::{NudgeError, PreferencesStore};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(Vec<String>),
}

/// An in-memory [`PreferencesStore`] for testing.
///
/// `fail_all()` makes every operation return a storage error, for
/// exercising the swallow-and-degrade paths.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent store operation fail.
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Restores normal operation.
    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), NudgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NudgeError::Storage {
                source: Box::new(std::io::Error::other("simulated store failure")),
            });
        }
        Ok(())
    }
}

impl PreferencesStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, NudgeError> {
        self.check()?;
        let values = self.values.lock().expect("store poisoned");
        Ok(match values.get(key) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        })
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), NudgeError> {
        self.check()?;
        self.values
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), Value::Text(value.to_string()));
        Ok(())
    }

    fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, NudgeError> {
        self.check()?;
        let values = self.values.lock().expect("store poisoned");
        Ok(match values.get(key) {
            Some(Value::List(list)) => Some(list.clone()),
            _ => None,
        })
    }

    fn set_string_list(&self, key: &str, value: &[String]) -> Result<(), NudgeError> {
        self.check()?;
        self.values
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), Value::List(value.to_vec()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), NudgeError> {
        self.check()?;
        self.values.lock().expect("store poisoned").remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), NudgeError> {
        self.check()?;
        self.values.lock().expect("store poisoned").clear();
        Ok(())
    }
}
