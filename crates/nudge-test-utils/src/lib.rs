// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for deterministic Nudge SDK tests.
//!
//! Every collaborator trait has a scripted mock here: injectable results,
//! captured calls for assertion, and no real platform or network access.

pub mod mock_fetcher;
pub mod mock_host;
pub mod mock_store;
pub mod mock_surface;

pub use mock_fetcher::MockFetcher;
pub use mock_host::{MockHost, MockOpener};
pub use mock_store::MemoryStore;
pub use mock_surface::MockSurface;

use chrono::{DateTime, Utc};
use nudge_core::types::{Widget, WidgetType, WidgetsResponse};

/// Builds a widget definition with the fields the core filters on.
pub fn widget(id: &str, widget_type: WidgetType, expiry: Option<DateTime<Utc>>) -> Widget {
    Widget {
        id: id.to_string(),
        widget_type,
        expiry,
        is_gdpr: false,
        html: String::new(),
    }
}

/// Builds a widgets response carrying the given definitions.
pub fn widgets_response(widgets: Vec<Widget>, session_id: Option<&str>) -> WidgetsResponse {
    WidgetsResponse {
        widgets,
        session_id: session_id.map(str::to_string),
        ..WidgetsResponse::default()
    }
}
