// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handshake between the SDK and the widget content host.
//!
//! A widget is not rendered by loading its HTML alone: the SDK loads the
//! bundled markup once, injects the console bridge and the widget
//! application script, fetches the widget definitions for the requested id,
//! hands them to the content as a config payload, and asks it to start.
//! [`WidgetHandshake`] drives that sequence as an explicit state machine so
//! every failure names the step it died in.
//!
//! The handshake outlives individual attempts. Content and scripts stay
//! loaded across attempts; `close()` bumps an epoch so a fetch that was in
//! flight when the widget was dismissed is discarded instead of acted on.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use nudge_config::CaptureConfig;
use nudge_core::{
    ContentHost, NudgeError, WidgetFetcher, WidgetId, WidgetType, WidgetViewConfig, WidgetsRequest,
    WidgetsResponse,
};
use regex::Regex;
use tracing::{debug, warn};

use crate::prefs::SessionStore;

/// JavaScript object the injected application script exposes to the SDK.
const JS_NAMESPACE: &str = "widgetHost";

/// Console bridge installed before the application script, so content-side
/// logs and uncaught errors surface through the host's message channel.
const CONSOLE_SHIM: &str = r#"
(function () {
    function forward(name, body) {
        if (window.nudgeBridge) {
            window.nudgeBridge.postMessage(name, body);
        }
    }
    console.log = function (message) {
        forward('log', message);
    };
    window.onerror = function (message, source, lineno) {
        forward('error', JSON.stringify({ message: message, source: source, line: lineno }));
    };
    true;
})();
"#;

/// Step the handshake is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    /// Markup is being loaded into the content host.
    ContentLoading,
    /// Console bridge and application script are injected and evaluated.
    ScriptsInjected,
    /// Widget definitions are being fetched for the current attempt.
    ConfigRequested,
    /// The view config was handed to the content.
    ConfigInjected,
    /// The start directive was issued to the content.
    Started,
    /// The content acknowledged the start; the widget is rendering.
    Success,
    /// The current attempt failed. A later attempt may run again.
    Failed,
    /// The handshake was closed; in-flight work for it must be discarded.
    Closed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::Idle => "idle",
            HandshakeState::ContentLoading => "content-loading",
            HandshakeState::ScriptsInjected => "scripts-injected",
            HandshakeState::ConfigRequested => "config-requested",
            HandshakeState::ConfigInjected => "config-injected",
            HandshakeState::Started => "started",
            HandshakeState::Success => "success",
            HandshakeState::Failed => "failed",
            HandshakeState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// The SDK-bundled content assets: the host page markup and the widget
/// application script evaluated into it.
#[derive(Debug, Clone)]
pub struct WidgetBundle {
    pub markup: String,
    pub app_script: String,
}

/// Drives the load/inject/fetch/config/start sequence against a content
/// host.
///
/// One handshake instance serves the lifetime of its content host. Markup
/// load and script injection happen once; each `run()` performs the fetch
/// and config steps for one widget id.
pub struct WidgetHandshake {
    host: Arc<dyn ContentHost>,
    fetcher: Arc<dyn WidgetFetcher>,
    sessions: SessionStore,
    capture: CaptureConfig,
    preview_mode: bool,
    bundle: WidgetBundle,
    prepared_markup: OnceLock<String>,
    loaded: AtomicBool,
    state: Mutex<HandshakeState>,
    widget_id: Mutex<Option<WidgetId>>,
    /// Bumped by `close()`. A `run()` that observes a different epoch than
    /// it started with discards its results.
    epoch: AtomicU64,
}

impl WidgetHandshake {
    pub fn new(
        host: Arc<dyn ContentHost>,
        fetcher: Arc<dyn WidgetFetcher>,
        sessions: SessionStore,
        capture: CaptureConfig,
        preview_mode: bool,
        bundle: WidgetBundle,
    ) -> Self {
        Self {
            host,
            fetcher,
            sessions,
            capture,
            preview_mode,
            bundle,
            prepared_markup: OnceLock::new(),
            loaded: AtomicBool::new(false),
            state: Mutex::new(HandshakeState::Idle),
            widget_id: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> HandshakeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The widget id of the current attempt, if one is in progress.
    pub fn current_widget(&self) -> Option<WidgetId> {
        self.widget_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, next: HandshakeState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = %state, to = %next, "handshake state");
        *state = next;
    }

    fn fail(&self, error: NudgeError) -> NudgeError {
        self.set_state(HandshakeState::Failed);
        error
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) != epoch
    }

    /// Advances the state machine unless `close()` has invalidated the
    /// attempt, in which case the `Closed` state is left untouched.
    fn transition(&self, epoch: u64, next: HandshakeState) -> Result<(), NudgeError> {
        if self.is_stale(epoch) {
            return Err(NudgeError::Superseded);
        }
        self.set_state(next);
        Ok(())
    }

    /// Runs the handshake for one widget id through to the content's
    /// `start()` acknowledgement.
    ///
    /// Returns [`NudgeError::Superseded`] when `close()` raced any awaited
    /// step, in which case the result was discarded and no session state
    /// was touched.
    pub async fn run(
        &self,
        widget_id: &WidgetId,
        context: HashMap<String, String>,
    ) -> Result<(), NudgeError> {
        let epoch = self.epoch.load(Ordering::Acquire);
        *self
            .widget_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(widget_id.clone());

        if !self.loaded.load(Ordering::Acquire) {
            self.set_state(HandshakeState::ContentLoading);
            let markup = self
                .prepared_markup
                .get_or_init(|| strip_app_script_tag(&self.bundle.markup));
            if let Err(e) = self.host.load(markup).await {
                return Err(self.fail(e));
            }
            if let Err(e) = self.host.evaluate(CONSOLE_SHIM).await {
                return Err(self.fail(e));
            }
            if let Err(e) = self.host.evaluate(&self.bundle.app_script).await {
                return Err(self.fail(e));
            }
            self.loaded.store(true, Ordering::Release);
        }
        self.transition(epoch, HandshakeState::ScriptsInjected)?;

        if self.preview_mode {
            // Preview render contexts have no network or interaction; stop
            // before the fetch rather than time out inside it.
            return Err(self.fail(NudgeError::ContentLoadFailed {
                message: "non-interactive preview render context".into(),
            }));
        }

        self.set_state(HandshakeState::ConfigRequested);
        let request = WidgetsRequest::with_identity(
            self.sessions.session(),
            self.capture.application_key.clone(),
            &self.sessions.user(),
        );
        let response = match self.fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(e) => {
                if self.is_stale(epoch) {
                    return Err(NudgeError::Superseded);
                }
                return Err(self.fail(e));
            }
        };
        if self.is_stale(epoch) {
            debug!(widget = %widget_id, "discarding fetch response for closed handshake");
            return Err(NudgeError::Superseded);
        }

        if let Some(session) = &response.session_id {
            self.sessions.set_session(session);
        }

        let data = filter_widgets(response, widget_id, Utc::now());
        if data.widgets.is_empty() {
            // Expired or mistyped definitions must not reach the content;
            // an empty config would render a blank overlay.
            return Err(self.fail(NudgeError::ContentLoadFailed {
                message: format!("no eligible widget definition for {widget_id}"),
            }));
        }

        let config = WidgetViewConfig {
            token: self.capture.application_key.clone(),
            endpoint: self.capture.api_endpoint.clone(),
            capture_js_url: self.capture.capture_js_url.clone(),
            data,
            context,
        };
        let payload = serde_json::to_string(&config).map_err(|e| {
            self.fail(NudgeError::Internal(format!(
                "failed to encode view config: {e}"
            )))
        })?;

        let inject = format!("{JS_NAMESPACE}.setConfig({payload}); {JS_NAMESPACE}.hasConfig();");
        let has_config = match self.host.evaluate(&inject).await {
            Ok(result) => is_truthy(&result),
            Err(e) => {
                if self.is_stale(epoch) {
                    return Err(NudgeError::Superseded);
                }
                return Err(self.fail(e));
            }
        };
        self.transition(epoch, HandshakeState::ConfigInjected)?;
        if !has_config {
            // The content should have stored the config; starting anyway
            // lets it fall back to its own bootstrap path.
            warn!(widget = %widget_id, "content reported no stored config");
        }

        self.transition(epoch, HandshakeState::Started)?;
        if let Err(e) = self.host.evaluate(&format!("{JS_NAMESPACE}.start();")).await {
            if self.is_stale(epoch) {
                return Err(NudgeError::Superseded);
            }
            return Err(self.fail(e));
        }
        self.transition(epoch, HandshakeState::Success)?;
        Ok(())
    }

    /// Ends the current attempt and invalidates any in-flight fetch for it.
    pub fn close(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        *self
            .widget_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.set_state(HandshakeState::Closed);
    }
}

/// Removes the external application-script tag from the bundled markup.
///
/// The script is evaluated manually after load instead, so the content
/// host never issues the cross-origin file request the tag would trigger.
fn strip_app_script_tag(markup: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#"<script[^>]*\bsrc\s*=\s*["'][^"']*app\.js["'][^>]*>\s*</script>"#)
            .expect("static pattern is valid")
    });
    pattern.replace_all(markup, "").into_owned()
}

/// Narrows a widgets response to the definitions worth presenting for the
/// requested id: matching id, popup type, not expired.
fn filter_widgets(
    mut response: WidgetsResponse,
    requested: &WidgetId,
    now: DateTime<Utc>,
) -> WidgetsResponse {
    response.widgets.retain(|widget| {
        widget.id == requested.as_str()
            && widget.widget_type == WidgetType::Popup
            && widget.expiry.is_none_or(|expiry| expiry > now)
    });
    response
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}
