// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock content host for deterministic handshake testing.
//!
//! `MockHost` implements `ContentHost` with scripted evaluation results and
//! captured loads/evaluations for assertion. Tests drive host-initiated
//! events through `emit_message()` and `request_navigation()`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nudge_core::{ContentHost, ExternalOpener, HostObserver, NavigationPolicy, NudgeError};

/// A mock embedded web view.
///
/// Evaluation behavior is scripted per substring: `fail_matching()` makes
/// any script containing the substring fail, `result_for()` pins the JSON
/// result of matching scripts. Unmatched scripts evaluate to `true`.
#[derive(Default)]
pub struct MockHost {
    observer: Mutex<Option<Arc<dyn HostObserver>>>,
    loads: Mutex<Vec<String>>,
    evaluations: Mutex<Vec<String>>,
    fail_load: Mutex<Option<String>>,
    failures: Mutex<Vec<String>>,
    results: Mutex<Vec<(String, serde_json::Value)>>,
    delays: Mutex<Vec<(String, Duration)>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `load()` calls fail with the given message.
    pub fn fail_load(&self, message: &str) {
        *self.fail_load.lock().expect("mock poisoned") = Some(message.to_string());
    }

    /// Makes any script containing `substr` fail evaluation.
    pub fn fail_matching(&self, substr: &str) {
        self.failures
            .lock()
            .expect("mock poisoned")
            .push(substr.to_string());
    }

    /// Delays evaluation of scripts containing `substr`, simulating slow
    /// content-side work.
    pub fn delay_matching(&self, substr: &str, delay: Duration) {
        self.delays
            .lock()
            .expect("mock poisoned")
            .push((substr.to_string(), delay));
    }

    /// Pins the result returned for scripts containing `substr`.
    pub fn result_for(&self, substr: &str, result: serde_json::Value) {
        self.results
            .lock()
            .expect("mock poisoned")
            .push((substr.to_string(), result));
    }

    /// Markup strings passed to `load()`.
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().expect("mock poisoned").clone()
    }

    /// Scripts passed to `evaluate()`, in order.
    pub fn evaluations(&self) -> Vec<String> {
        self.evaluations.lock().expect("mock poisoned").clone()
    }

    /// Whether any evaluated script contained `substr`.
    pub fn evaluated(&self, substr: &str) -> bool {
        self.evaluations().iter().any(|s| s.contains(substr))
    }

    /// Dispatches a named script message to the registered observer.
    pub fn emit_message(&self, name: &str, body: serde_json::Value) {
        let observer = self.observer.lock().expect("mock poisoned").clone();
        if let Some(observer) = observer {
            observer.on_message(name, &body);
        }
    }

    /// Asks the registered observer for a navigation decision.
    pub fn request_navigation(&self, url: &str) -> Option<NavigationPolicy> {
        let observer = self.observer.lock().expect("mock poisoned").clone();
        observer.map(|o| o.on_navigation(url))
    }
}

#[async_trait]
impl ContentHost for MockHost {
    async fn load(&self, markup: &str) -> Result<(), NudgeError> {
        if let Some(message) = self.fail_load.lock().expect("mock poisoned").clone() {
            return Err(NudgeError::ContentLoadFailed { message });
        }
        self.loads
            .lock()
            .expect("mock poisoned")
            .push(markup.to_string());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, NudgeError> {
        self.evaluations
            .lock()
            .expect("mock poisoned")
            .push(script.to_string());

        let delay = self
            .delays
            .lock()
            .expect("mock poisoned")
            .iter()
            .find(|(substr, _)| script.contains(substr.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        for substr in self.failures.lock().expect("mock poisoned").iter() {
            if script.contains(substr.as_str()) {
                return Err(NudgeError::Script {
                    message: format!("simulated evaluation failure for {substr:?}"),
                });
            }
        }

        for (substr, result) in self.results.lock().expect("mock poisoned").iter() {
            if script.contains(substr.as_str()) {
                return Ok(result.clone());
            }
        }

        Ok(serde_json::Value::Bool(true))
    }

    fn set_observer(&self, observer: Arc<dyn HostObserver>) {
        *self.observer.lock().expect("mock poisoned") = Some(observer);
    }
}

/// A mock external URL opener with a configurable openable predicate.
#[derive(Default)]
pub struct MockOpener {
    openable_prefixes: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks URLs with the given prefix as externally openable.
    pub fn allow_prefix(&self, prefix: &str) {
        self.openable_prefixes
            .lock()
            .expect("mock poisoned")
            .push(prefix.to_string());
    }

    /// URLs handed to `open()`.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("mock poisoned").clone()
    }
}

impl ExternalOpener for MockOpener {
    fn can_open(&self, url: &str) -> bool {
        self.openable_prefixes
            .lock()
            .expect("mock poisoned")
            .iter()
            .any(|p| url.starts_with(p.as_str()))
    }

    fn open(&self, url: &str) {
        self.opened
            .lock()
            .expect("mock poisoned")
            .push(url.to_string());
    }
}
