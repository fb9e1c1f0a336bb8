// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Widget scheduling: the queue-drain/gate/handshake orchestration.
//!
//! [`WidgetScheduler`] owns the durable queue, the presentation gate, and
//! the content-host handshake, and is the surface host applications talk
//! to: `queue_widget` for deferred presentation, `show_widget` for an
//! immediate attempt, `hide_widget` on dismissal. Queue drains are
//! debounced so bursts of triggers (queue calls, foreground transitions,
//! reachability flaps) collapse into one attempt.

use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::time::Duration;

use nudge_api::CaptureClient;
use nudge_config::NudgeConfig;
use nudge_core::{
    ContentHost, ExternalOpener, HostObserver, NavigationPolicy, NudgeError, PlatformEvent,
    PreferencesStore, PresentationSurface, UserIdentity, WidgetFetcher, WidgetId,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::page_context;
use crate::gate::PresentationGate;
use crate::handshake::{HandshakeState, WidgetBundle, WidgetHandshake};
use crate::prefs::{JsonFileStore, SessionStore};
use crate::queue::WidgetQueue;

/// Structured message kind the content sends when its close control is
/// activated.
const MSG_WIDGET_CLOSE: &str = "widget-close";
/// Structured message kind for content-side activity tracking events.
const MSG_WIDGET_TRACK: &str = "widget-track";
/// Structured message kind for content-side unhandled errors.
const MSG_UNHANDLED_ERROR: &str = "unhandled-error";

static SHARED: OnceLock<Arc<WidgetScheduler>> = OnceLock::new();

/// Orchestrates widget presentation for one content host.
///
/// Construct through [`WidgetScheduler::initialize`] (production wiring,
/// registered as the process-wide instance) or
/// [`WidgetScheduler::with_components`] (explicit collaborators).
pub struct WidgetScheduler {
    config: NudgeConfig,
    queue: WidgetQueue,
    gate: PresentationGate,
    handshake: WidgetHandshake,
    surface: Arc<dyn PresentationSurface>,
    store: Arc<dyn PreferencesStore>,
    sessions: SessionStore,
    screen_name: Mutex<Option<String>>,
    debounce: Mutex<Option<JoinHandle<()>>>,
    teardown: CancellationToken,
}

impl WidgetScheduler {
    /// Wires the production collaborators (HTTP fetcher, JSON-file store)
    /// and registers the instance as the process-wide scheduler.
    ///
    /// Fails if the configuration is invalid or a scheduler was already
    /// initialized.
    pub fn initialize(
        config: NudgeConfig,
        host: Arc<dyn ContentHost>,
        surface: Arc<dyn PresentationSurface>,
        opener: Arc<dyn ExternalOpener>,
        bundle: WidgetBundle,
    ) -> Result<Arc<Self>, NudgeError> {
        let config = nudge_config::validate(config)?;
        if !surface.is_available() {
            return Err(NudgeError::NoPresentationSurface);
        }
        let fetcher = Arc::new(CaptureClient::new(config.capture.api_endpoint.clone())?);
        let store = Arc::new(JsonFileStore::at_default_location()?);
        let scheduler = Self::with_components(config, host, fetcher, surface, opener, store, bundle);
        SHARED
            .set(scheduler.clone())
            .map_err(|_| NudgeError::Config("nudge is already initialized".into()))?;
        Ok(scheduler)
    }

    /// The process-wide scheduler, if [`initialize`](Self::initialize) ran.
    pub fn shared() -> Option<Arc<WidgetScheduler>> {
        SHARED.get().cloned()
    }

    /// Builds a scheduler over explicit collaborators and registers it as
    /// the content host's observer.
    ///
    /// The configuration is taken as already validated.
    pub fn with_components(
        config: NudgeConfig,
        host: Arc<dyn ContentHost>,
        fetcher: Arc<dyn WidgetFetcher>,
        surface: Arc<dyn PresentationSurface>,
        opener: Arc<dyn ExternalOpener>,
        store: Arc<dyn PreferencesStore>,
        bundle: WidgetBundle,
    ) -> Arc<Self> {
        let sessions = SessionStore::new(store.clone());
        let handshake = WidgetHandshake::new(
            host.clone(),
            fetcher,
            sessions.clone(),
            config.capture.clone(),
            config.widget.preview_mode,
            bundle,
        );

        let scheduler = Arc::new(Self {
            queue: WidgetQueue::new(store.clone()),
            gate: PresentationGate::new(),
            handshake,
            surface,
            store,
            sessions,
            screen_name: Mutex::new(None),
            debounce: Mutex::new(None),
            teardown: CancellationToken::new(),
            config,
        });

        host.set_observer(Arc::new(SchedulerObserver {
            scheduler: Arc::downgrade(&scheduler),
            opener,
        }));

        scheduler
    }

    /// Subscribes to platform signals: foreground entry and restored
    /// reachability re-arm the queue drain, lost reachability cancels a
    /// pending one.
    ///
    /// The listener ends when the scheduler is dropped.
    pub fn observe_signals(self: &Arc<Self>, signals: &broadcast::Sender<PlatformEvent>) {
        let mut rx = signals.subscribe();
        let weak = Arc::downgrade(self);
        let teardown = self.teardown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = teardown.cancelled() => break,
                    event = rx.recv() => {
                        let Some(this) = weak.upgrade() else { break };
                        match event {
                            Ok(PlatformEvent::ForegroundEntered)
                            | Ok(PlatformEvent::ReachabilityChanged { reachable: true }) => {
                                this.process_next_from_queue();
                            }
                            Ok(PlatformEvent::ReachabilityChanged { reachable: false }) => {
                                debug!("network unreachable, holding queued widgets");
                                this.cancel_debounce();
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(skipped, "platform signal receiver lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });
    }

    /// Queues a widget for presentation and arms the debounced drain.
    ///
    /// Queueing an already-queued id re-arms the drain without reordering.
    pub fn queue_widget(self: &Arc<Self>, id: &WidgetId) {
        debug!(widget = %id, "queueing widget");
        self.queue.enqueue(id);
        self.process_next_from_queue();
    }

    /// Arms (or re-arms) the debounced queue drain. After the debounce
    /// window, the most recently queued widget is attempted unless one is
    /// already active.
    pub fn process_next_from_queue(self: &Arc<Self>) {
        self.cancel_debounce();

        let weak = Arc::downgrade(self);
        let delay = Duration::from_secs(self.config.widget.debounce_secs);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(this) = weak.upgrade() else { return };
            if this.gate.is_active() {
                debug!("widget already active, deferring queue drain");
                return;
            }
            let Some(id) = this.queue.peek_next() else { return };
            if let Err(e) = this.show_widget(&id).await {
                warn!(widget = %id, error = %e, "queued widget attempt failed");
            }
        });

        let previous = self
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn cancel_debounce(&self) {
        if let Some(handle) = self
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    /// Attempts to present a widget immediately.
    ///
    /// Wins or fails the gate atomically; on a transient failure the widget
    /// is re-queued for a later drain. On success the gate stays held until
    /// [`hide_widget`](Self::hide_widget).
    pub async fn show_widget(&self, id: &WidgetId) -> Result<(), NudgeError> {
        if !self.gate.try_acquire() {
            debug!(widget = %id, "another widget is active");
            return Err(NudgeError::AlreadyActive);
        }
        self.queue.remove(id);

        match self.run_attempt(id).await {
            Ok(()) => {
                info!(widget = %id, "widget presented");
                Ok(())
            }
            // The attempt was dismissed mid-flight; the close path already
            // released the gate.
            Err(NudgeError::Superseded) => Err(NudgeError::Superseded),
            Err(e) => {
                self.gate.release();
                if e.is_transient() {
                    debug!(widget = %id, "re-queueing after transient failure");
                    self.queue.enqueue(id);
                }
                Err(e)
            }
        }
    }

    async fn run_attempt(&self, id: &WidgetId) -> Result<(), NudgeError> {
        if !self.surface.is_available() {
            return Err(NudgeError::NoPresentationSurface);
        }

        let deadline = Duration::from_secs(self.config.widget.presentation_timeout_secs);
        let screen = self
            .screen_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let context = page_context(screen.as_deref(), self.config.capture.app_name.as_deref());

        let attempt = async {
            self.handshake.run(id, context).await?;
            // A dismissal may have landed between the handshake completing
            // and this point; presenting now would race the released gate.
            if self.handshake.state() != HandshakeState::Success {
                return Err(NudgeError::Superseded);
            }
            self.surface.present().await
        };
        match tokio::time::timeout(deadline, attempt).await {
            Ok(result) => result,
            Err(_) => Err(NudgeError::PresentationTimeout { duration: deadline }),
        }
    }

    /// Dismisses the active widget after the configured dismiss delay, then
    /// releases the gate and re-arms the queue drain.
    ///
    /// The delay lets the content's dismiss animation finish before the
    /// surface is torn down. Safe to call when nothing is active.
    pub fn hide_widget(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let delay = Duration::from_millis(self.config.widget.dismiss_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(this) = weak.upgrade() else { return };
            this.handshake.close();
            this.surface.dismiss().await;
            this.gate.release();
            this.process_next_from_queue();
        });
    }

    /// Names the screen for the page context of subsequent attempts.
    pub fn set_screen_name(&self, name: &str) {
        *self
            .screen_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(name.to_string());
    }

    pub fn clear_screen_name(&self) {
        *self
            .screen_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Persists the contact identity echoed in subsequent widget fetches.
    pub fn set_user(&self, user: &UserIdentity) {
        self.sessions.set_user(user);
    }

    pub fn clear_user(&self) {
        self.sessions.clear_user();
    }

    /// Drops all persisted SDK state (queue and session id).
    pub fn clear_data(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear persisted state");
        }
    }

    pub fn is_widget_active(&self) -> bool {
        self.gate.is_active()
    }

    /// The widget next in line, without consuming it.
    pub fn pending_widget(&self) -> Option<WidgetId> {
        self.queue.peek_next()
    }
}

impl Drop for WidgetScheduler {
    fn drop(&mut self) {
        self.teardown.cancel();
        if let Some(handle) = self
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

/// Routes content-host events back into the scheduler.
///
/// Holds the scheduler weakly: the host may outlive the scheduler, and a
/// dangling observer must not keep it alive.
struct SchedulerObserver {
    scheduler: Weak<WidgetScheduler>,
    opener: Arc<dyn ExternalOpener>,
}

impl HostObserver for SchedulerObserver {
    fn on_message(&self, name: &str, body: &Value) {
        match name {
            "log" => debug!(message = %body, "content log"),
            "error" => warn!(message = %body, "content error"),
            "messageHandler" => {
                let kind = body.get("type").and_then(Value::as_str).unwrap_or_default();
                match kind {
                    MSG_WIDGET_CLOSE => {
                        if let Some(scheduler) = self.scheduler.upgrade() {
                            scheduler.hide_widget();
                        }
                    }
                    MSG_WIDGET_TRACK => debug!(payload = %body, "content track event"),
                    MSG_UNHANDLED_ERROR => error!(payload = %body, "content unhandled error"),
                    other => debug!(kind = other, "unrecognized content message"),
                }
            }
            other => debug!(name = other, "unrecognized script message"),
        }
    }

    fn on_navigation(&self, url: &str) -> NavigationPolicy {
        // Local resource loads stay inside the host.
        if url.starts_with("file:") || url == "about:blank" {
            return NavigationPolicy::Allow;
        }
        if self.opener.can_open(url) {
            debug!(url, "opening link externally");
            self.opener.open(url);
            return NavigationPolicy::Cancel;
        }
        NavigationPolicy::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_config::{CaptureConfig, WidgetConfig};
    use nudge_test_utils::{
        MemoryStore, MockFetcher, MockHost, MockOpener, MockSurface, widget, widgets_response,
    };
    use nudge_core::WidgetType;

    fn test_config() -> NudgeConfig {
        NudgeConfig {
            capture: CaptureConfig {
                application_key: "app-key".into(),
                api_endpoint: "https://capture-api.example.com".into(),
                capture_js_url: "https://cdn.example.com/capture.js".into(),
                app_name: Some("Shop".into()),
            },
            widget: WidgetConfig {
                debounce_secs: 3,
                dismiss_delay_ms: 500,
                presentation_timeout_secs: 10,
                preview_mode: false,
            },
        }
    }

    fn test_bundle() -> WidgetBundle {
        WidgetBundle {
            markup: "<html></html>".into(),
            app_script: "var widgetHost = {};".into(),
        }
    }

    struct Fixture {
        scheduler: Arc<WidgetScheduler>,
        host: Arc<MockHost>,
        opener: Arc<MockOpener>,
    }

    fn fixture() -> Fixture {
        let host = Arc::new(MockHost::new());
        let opener = Arc::new(MockOpener::new());
        let fetcher = Arc::new(MockFetcher::with_response(widgets_response(
            vec![widget("w1", WidgetType::Popup, None)],
            None,
        )));
        let scheduler = WidgetScheduler::with_components(
            test_config(),
            host.clone(),
            fetcher,
            Arc::new(MockSurface::new()),
            opener.clone(),
            Arc::new(MemoryStore::new()),
            test_bundle(),
        );
        Fixture {
            scheduler,
            host,
            opener,
        }
    }

    #[tokio::test]
    async fn file_navigation_is_allowed() {
        let f = fixture();
        assert_eq!(
            f.host.request_navigation("file:///bundle/index.html"),
            Some(NavigationPolicy::Allow)
        );
        drop(f.scheduler);
    }

    #[tokio::test]
    async fn external_links_are_cancelled_and_opened() {
        let f = fixture();
        f.opener.allow_prefix("https://");

        assert_eq!(
            f.host.request_navigation("https://example.com/offer"),
            Some(NavigationPolicy::Cancel)
        );
        assert_eq!(f.opener.opened(), vec!["https://example.com/offer".to_string()]);
    }

    #[tokio::test]
    async fn unopenable_links_fall_through() {
        let f = fixture();
        assert_eq!(
            f.host.request_navigation("weird-scheme://x"),
            Some(NavigationPolicy::Allow)
        );
        assert!(f.opener.opened().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_message_hides_after_dismiss_delay() {
        let f = fixture();
        f.scheduler.show_widget(&WidgetId::from("w1")).await.unwrap();
        assert!(f.scheduler.is_widget_active());

        f.host
            .emit_message("messageHandler", serde_json::json!({ "type": "widget-close" }));
        // Still active until the dismiss delay has elapsed.
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(f.scheduler.is_widget_active());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!f.scheduler.is_widget_active());
    }

    #[tokio::test]
    async fn log_and_track_messages_are_ignored() {
        let f = fixture();
        f.host.emit_message("log", serde_json::json!("hello"));
        f.host
            .emit_message("messageHandler", serde_json::json!({ "type": "widget-track" }));
        assert!(!f.scheduler.is_widget_active());
    }

    #[tokio::test]
    async fn dropped_scheduler_leaves_observer_inert() {
        let f = fixture();
        let host = f.host.clone();
        drop(f.scheduler);
        // No upgrade target left; the message must not panic.
        host.emit_message("messageHandler", serde_json::json!({ "type": "widget-close" }));
    }
}
