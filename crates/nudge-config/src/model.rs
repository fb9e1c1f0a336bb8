// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Nudge widget SDK.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Nudge configuration.
///
/// Loaded from a TOML file with `NUDGE_*` environment variable overrides,
/// or constructed programmatically by the host application.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NudgeConfig {
    /// Backend account and endpoint settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Widget presentation and scheduling settings.
    #[serde(default)]
    pub widget: WidgetConfig,
}

/// Backend account and endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// The account's application key (request token for the widgets endpoint).
    #[serde(default)]
    pub application_key: String,

    /// Base URL of the marketing API, without trailing slash.
    #[serde(default)]
    pub api_endpoint: String,

    /// URL of the hosted capture script the content host loads data through.
    #[serde(default)]
    pub capture_js_url: String,

    /// Display name used for the page context when no screen name is set.
    #[serde(default)]
    pub app_name: Option<String>,
}

/// Widget presentation and scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    /// Debounce delay before a queued widget is attempted, in seconds.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Delay before teardown after hide, so dismiss animations complete.
    #[serde(default = "default_dismiss_delay_ms")]
    pub dismiss_delay_ms: u64,

    /// Deadline for attaching and presenting the content host, in seconds.
    #[serde(default = "default_presentation_timeout_secs")]
    pub presentation_timeout_secs: u64,

    /// Non-interactive preview/test render context. Forces immediate attempt
    /// failure before any network call.
    #[serde(default = "default_preview_mode")]
    pub preview_mode: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            debounce_secs: default_debounce_secs(),
            dismiss_delay_ms: default_dismiss_delay_ms(),
            presentation_timeout_secs: default_presentation_timeout_secs(),
            preview_mode: default_preview_mode(),
        }
    }
}

fn default_debounce_secs() -> u64 {
    3
}

fn default_dismiss_delay_ms() -> u64 {
    500
}

fn default_presentation_timeout_secs() -> u64 {
    10
}

fn default_preview_mode() -> bool {
    std::env::var("NUDGE_PREVIEW_RENDER").is_ok_and(|v| v == "1")
}
