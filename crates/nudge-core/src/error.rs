// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Nudge widget SDK.

use thiserror::Error;

/// The primary error type used across all Nudge collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum NudgeError {
    /// Configuration errors (invalid TOML, missing required fields, malformed URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Widget API errors (request failure, bad status, undecodable response).
    #[error("api error: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Preferences store errors (read/write failure, corrupt snapshot).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Script evaluation failed inside the content host.
    #[error("script evaluation error: {message}")]
    Script { message: String },

    /// Another widget presentation currently holds the gate.
    #[error("a widget is already active")]
    AlreadyActive,

    /// No presentation surface is available to attach the content host to.
    #[error("no presentation surface available")]
    NoPresentationSurface,

    /// The content host failed to load the widget markup or its scripts.
    #[error("content load failed: {message}")]
    ContentLoadFailed { message: String },

    /// The content host loaded but could not be laid out on the surface.
    #[error("layout failed: {message}")]
    LayoutFailed { message: String },

    /// The content host could not be presented before the deadline.
    #[error("presentation timed out after {duration:?}")]
    PresentationTimeout { duration: std::time::Duration },

    /// The handshake this operation belonged to was closed or replaced.
    #[error("handshake session superseded")]
    Superseded,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NudgeError {
    /// Whether this error ends only the current attempt and the widget is
    /// worth re-queueing (network-class failures).
    pub fn is_transient(&self) -> bool {
        matches!(self, NudgeError::Api { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_transient() {
        let err = NudgeError::Api {
            message: "connection reset".into(),
            source: None,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn terminal_errors_are_not_transient() {
        assert!(!NudgeError::AlreadyActive.is_transient());
        assert!(!NudgeError::NoPresentationSurface.is_transient());
        assert!(
            !NudgeError::Script {
                message: "eval failed".into()
            }
            .is_transient()
        );
        assert!(
            !NudgeError::PresentationTimeout {
                duration: std::time::Duration::from_secs(10)
            }
            .is_transient()
        );
    }

    #[test]
    fn display_includes_context() {
        let err = NudgeError::ContentLoadFailed {
            message: "markup missing".into(),
        };
        assert!(err.to_string().contains("markup missing"));

        let err = NudgeError::Config("application_key is empty".into());
        assert!(err.to_string().contains("application_key"));
    }
}
