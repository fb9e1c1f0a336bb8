// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration validation and normalization.

use nudge_core::NudgeError;

use crate::model::NudgeConfig;

/// Validates a configuration and normalizes endpoint URLs.
///
/// Trailing slashes on `api_endpoint` are stripped so request paths can be
/// appended without doubling separators.
pub fn validate(mut config: NudgeConfig) -> Result<NudgeConfig, NudgeError> {
    if config.capture.application_key.trim().is_empty() {
        return Err(NudgeError::Config(
            "capture.application_key must be set".into(),
        ));
    }

    config.capture.api_endpoint = normalize_endpoint(&config.capture.api_endpoint)?;

    if !is_http_url(&config.capture.capture_js_url) {
        return Err(NudgeError::Config(format!(
            "capture.capture_js_url is not an http(s) URL: {:?}",
            config.capture.capture_js_url
        )));
    }

    if config.widget.presentation_timeout_secs == 0 {
        return Err(NudgeError::Config(
            "widget.presentation_timeout_secs must be at least 1".into(),
        ));
    }

    Ok(config)
}

fn normalize_endpoint(endpoint: &str) -> Result<String, NudgeError> {
    if !is_http_url(endpoint) {
        return Err(NudgeError::Config(format!(
            "capture.api_endpoint is not an http(s) URL: {endpoint:?}"
        )));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CaptureConfig, NudgeConfig};

    fn valid_config() -> NudgeConfig {
        NudgeConfig {
            capture: CaptureConfig {
                application_key: "key-123".into(),
                api_endpoint: "https://capture-api.example.com".into(),
                capture_js_url: "https://cdn.example.com/capture.js".into(),
                app_name: None,
            },
            ..NudgeConfig::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(valid_config()).is_ok());
    }

    #[test]
    fn missing_application_key_rejected() {
        let mut config = valid_config();
        config.capture.application_key = "  ".into();
        let err = validate(config).unwrap_err();
        assert!(err.to_string().contains("application_key"));
    }

    #[test]
    fn trailing_slash_stripped_from_endpoint() {
        let mut config = valid_config();
        config.capture.api_endpoint = "https://capture-api.example.com/".into();
        let config = validate(config).unwrap();
        assert_eq!(config.capture.api_endpoint, "https://capture-api.example.com");
    }

    #[test]
    fn non_http_endpoint_rejected() {
        let mut config = valid_config();
        config.capture.api_endpoint = "ftp://example.com".into();
        assert!(validate(config).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = valid_config();
        config.widget.presentation_timeout_secs = 0;
        assert!(validate(config).is_err());
    }
}
