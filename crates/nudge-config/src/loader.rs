// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier): compiled defaults, `nudge.toml`
//! in the working directory, then `NUDGE_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NudgeConfig;

/// Load configuration from `nudge.toml` with env var overrides.
pub fn load_config() -> Result<NudgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NudgeConfig::default()))
        .merge(Toml::file("nudge.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no file lookup).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<NudgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NudgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NudgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NudgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment variable provider mapping `NUDGE_<SECTION>_<KEY>` onto the
/// config sections.
///
/// Uses explicit `map()` rather than `split("_")` so underscore-containing
/// key names (`application_key`, `capture_js_url`) stay unambiguous.
fn env_provider() -> Env {
    Env::prefixed("NUDGE_").map(|key| {
        let lower = key.as_str().to_ascii_lowercase();
        for section in ["capture", "widget"] {
            if let Some(rest) = lower.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        lower.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [capture]
            application_key = "key-123"
            api_endpoint = "https://capture-api.example.com"
            capture_js_url = "https://cdn.example.com/capture.js"

            [widget]
            debounce_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.application_key, "key-123");
        assert_eq!(config.widget.debounce_secs, 5);
        // Untouched keys keep compiled defaults.
        assert_eq!(config.widget.dismiss_delay_ms, 500);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.capture.application_key.is_empty());
        assert_eq!(config.widget.presentation_timeout_secs, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [widget]
            debounce = 5
            "#,
        );
        assert!(result.is_err());
    }
}
