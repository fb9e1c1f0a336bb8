// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page context sent to the content alongside the view config.

use std::collections::HashMap;

/// Context key naming the screen the widget was shown on.
pub const SHOWN_ON_SCREEN: &str = "shown_on_screen";

/// Builds the page context map for a handshake attempt.
///
/// The screen name set by the host application wins; the configured app
/// name is the fallback, then a fixed placeholder.
pub fn page_context(screen_name: Option<&str>, app_name: Option<&str>) -> HashMap<String, String> {
    let shown_on = screen_name.or(app_name).unwrap_or("Unknown");
    HashMap::from([(SHOWN_ON_SCREEN.to_string(), shown_on.to_string())])
}
