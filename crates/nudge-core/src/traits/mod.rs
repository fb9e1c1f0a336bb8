// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits for the Nudge widget SDK.
//!
//! The SDK core is platform-agnostic: everything that touches the host
//! platform (web view, window, key-value store, HTTP) is injected through
//! the traits defined here.

pub mod fetcher;
pub mod host;
pub mod prefs;
pub mod surface;

pub use fetcher::WidgetFetcher;
pub use host::{ContentHost, ExternalOpener, HostObserver, NavigationPolicy};
pub use prefs::PreferencesStore;
pub use surface::PresentationSurface;
