// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content host abstraction for the embedded web-rendering surface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::NudgeError;

/// Decision for a navigation requested from inside the content host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
}

/// The embedded web-rendering surface that displays widget markup and runs
/// its script.
///
/// Implementations wrap the platform web view. Host-initiated events
/// (script messages, navigation requests) are dispatched synchronously to
/// the registered [`HostObserver`].
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Loads the widget markup into the host. Resolves once the document
    /// has finished loading.
    async fn load(&self, markup: &str) -> Result<(), NudgeError>;

    /// Evaluates a script in the loaded document and returns its result as
    /// JSON.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, NudgeError>;

    /// Registers the observer receiving host-initiated events. Replaces any
    /// previously registered observer.
    fn set_observer(&self, observer: Arc<dyn HostObserver>);
}

/// Capability interface for host-initiated events.
///
/// Dispatched synchronously by the content host wrapper.
pub trait HostObserver: Send + Sync {
    /// A named script message arrived from the content (`log`, `error`, or
    /// the structured `messageHandler` channel).
    fn on_message(&self, name: &str, body: &serde_json::Value);

    /// The content requested a navigation to `url`. Returning
    /// [`NavigationPolicy::Cancel`] stops the in-host navigation.
    fn on_navigation(&self, url: &str) -> NavigationPolicy;
}

/// Platform capability for opening URLs outside the content host.
pub trait ExternalOpener: Send + Sync {
    /// Whether the platform can handle this URL externally.
    fn can_open(&self, url: &str) -> bool;

    /// Hands the URL to the platform. Fire-and-forget.
    fn open(&self, url: &str);
}
