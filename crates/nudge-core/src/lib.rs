// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Nudge in-app widget SDK.
//!
//! This crate provides the collaborator traits, error type, and wire types
//! used throughout the Nudge workspace. Platform integrations (web view,
//! window, key-value store) and the HTTP client implement traits defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::NudgeError;
pub use types::{
    PlatformEvent, UserIdentity, Widget, WidgetId, WidgetType, WidgetViewConfig, WidgetsRequest,
    WidgetsResponse,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    ContentHost, ExternalOpener, HostObserver, NavigationPolicy, PreferencesStore,
    PresentationSurface, WidgetFetcher,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        // Each collaborator must be usable as a trait object behind Arc.
        fn _assert_host(_: &dyn ContentHost) {}
        fn _assert_observer(_: &dyn HostObserver) {}
        fn _assert_opener(_: &dyn ExternalOpener) {}
        fn _assert_surface(_: &dyn PresentationSurface) {}
        fn _assert_prefs(_: &dyn PreferencesStore) {}
        fn _assert_fetcher(_: &dyn WidgetFetcher) {}
    }

    #[test]
    fn navigation_policy_equality() {
        assert_eq!(NavigationPolicy::Allow, NavigationPolicy::Allow);
        assert_ne!(NavigationPolicy::Allow, NavigationPolicy::Cancel);
    }

    #[test]
    fn platform_event_carries_reachability() {
        let event = PlatformEvent::ReachabilityChanged { reachable: false };
        assert_ne!(event, PlatformEvent::ForegroundEntered);
    }
}
