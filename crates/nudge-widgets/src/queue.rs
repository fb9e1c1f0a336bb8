// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue of pending widget identifiers.
//!
//! The queue survives process restarts through the [`PreferencesStore`]
//! collaborator and is drained most-recently-queued-first: `enqueue`
//! inserts at the front, `peek_next` reads the front, and consumers remove
//! by id once a show attempt owns the gate. Storage failures degrade to an
//! empty/unchanged queue and are never surfaced.

use std::sync::Arc;

use nudge_core::{PreferencesStore, WidgetId};
use tracing::warn;

/// Store key holding the persisted queue snapshot.
const QUEUE_KEY: &str = "widget_queue";

/// Durable, duplicate-free, most-recent-first widget queue.
pub struct WidgetQueue {
    store: Arc<dyn PreferencesStore>,
}

impl WidgetQueue {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self { store }
    }

    /// Loads the persisted snapshot. A read failure degrades to empty.
    fn load(&self) -> Vec<String> {
        match self.store.get_string_list(QUEUE_KEY) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to load widget queue, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persists a snapshot. A write failure leaves the stored queue unchanged.
    fn save(&self, snapshot: &[String]) {
        if let Err(e) = self.store.set_string_list(QUEUE_KEY, snapshot) {
            warn!(error = %e, "failed to persist widget queue");
        }
    }

    /// Adds a widget id to the front of the queue.
    ///
    /// Re-queueing an already-queued id is a no-op and does not reorder.
    pub fn enqueue(&self, id: &WidgetId) {
        let mut snapshot = self.load();
        if snapshot.iter().any(|queued| queued == id.as_str()) {
            return;
        }
        snapshot.insert(0, id.as_str().to_string());
        self.save(&snapshot);
    }

    /// Removes a widget id if present. Idempotent.
    pub fn remove(&self, id: &WidgetId) {
        let mut snapshot = self.load();
        let before = snapshot.len();
        snapshot.retain(|queued| queued != id.as_str());
        if snapshot.len() != before {
            self.save(&snapshot);
        }
    }

    /// Returns the most recently queued id without removing it.
    pub fn peek_next(&self) -> Option<WidgetId> {
        self.load().first().map(|id| WidgetId(id.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }
}
