// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Nudge workspace.
//!
//! The wire types mirror the marketing API's widget endpoint: short
//! single-letter request keys and snake_case response keys. The core only
//! acts on `id`, `widget_type`, and `expiry`; everything else is carried
//! through verbatim into the injected view config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a widget definition, unique within a backend account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub String);

impl WidgetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        WidgetId(value.to_string())
    }
}

/// Kind of in-app message a widget definition renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Talk,
    Form,
    Popup,
    Bar,
    Notification,
    Prompt,
}

/// A server-defined widget definition.
///
/// Only the fields the client filters on are typed; the rendering payload
/// (`html`, style, fonts) passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_gdpr: bool,
    #[serde(default)]
    pub html: String,
}

/// Request body for the widgets endpoint.
///
/// Field names follow the API's abbreviated wire keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetsRequest {
    #[serde(rename = "s")]
    pub session_id: Option<String>,
    #[serde(rename = "h")]
    pub application_key: String,
    #[serde(rename = "c")]
    pub contact_id: Option<String>,
    #[serde(rename = "e")]
    pub email_address: Option<String>,
    #[serde(rename = "p")]
    pub phone_number: Option<String>,
    #[serde(rename = "u")]
    pub url: Option<String>,
    #[serde(rename = "tk")]
    pub talk_enabled: bool,
}

impl WidgetsRequest {
    pub fn new(session_id: Option<String>, application_key: String) -> Self {
        Self {
            session_id,
            application_key,
            contact_id: None,
            email_address: None,
            phone_number: None,
            url: None,
            talk_enabled: false,
        }
    }

    /// A request carrying the known contact identity fields.
    pub fn with_identity(
        session_id: Option<String>,
        application_key: String,
        identity: &UserIdentity,
    ) -> Self {
        Self {
            contact_id: identity.contact_id.clone(),
            email_address: identity.email_address.clone(),
            phone_number: identity.phone_number.clone(),
            ..Self::new(session_id, application_key)
        }
    }
}

/// Contact identity known to the host application, echoed to the widgets
/// endpoint so the backend can target by contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl UserIdentity {
    pub fn is_empty(&self) -> bool {
        self.contact_id.is_none() && self.email_address.is_none() && self.phone_number.is_none()
    }
}

/// Response body from the widgets endpoint.
///
/// The account-level flags are unused by core logic and pass through into
/// [`WidgetViewConfig`] verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetsResponse {
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub has_logo: bool,
    #[serde(default)]
    pub enabled_gdpr: bool,
    #[serde(default)]
    pub recaptcha_site_key: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub service_worker_url: Option<String>,
    #[serde(default)]
    pub cdn_url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Configuration payload injected into the content host, built fresh per
/// handshake attempt and never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetViewConfig {
    pub token: String,
    pub endpoint: String,
    pub capture_js_url: String,
    pub data: WidgetsResponse,
    pub context: std::collections::HashMap<String, String>,
}

/// Platform signals the scheduler reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The host application entered the foreground.
    ForegroundEntered,
    /// Network reachability changed.
    ReachabilityChanged { reachable: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widgets_request_uses_short_wire_keys() {
        let request = WidgetsRequest::new(Some("sess-1".into()), "app-key".into());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["s"], "sess-1");
        assert_eq!(json["h"], "app-key");
        assert_eq!(json["tk"], false);
        assert!(json["c"].is_null());
    }

    #[test]
    fn identity_fields_use_short_wire_keys() {
        let identity = UserIdentity {
            contact_id: Some("c-7".into()),
            email_address: Some("a@example.com".into()),
            phone_number: None,
        };
        let request = WidgetsRequest::with_identity(None, "app-key".into(), &identity);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["c"], "c-7");
        assert_eq!(json["e"], "a@example.com");
        assert!(json["p"].is_null());
    }

    #[test]
    fn empty_identity_is_detectable() {
        assert!(UserIdentity::default().is_empty());
        let identity = UserIdentity {
            email_address: Some("a@example.com".into()),
            ..UserIdentity::default()
        };
        assert!(!identity.is_empty());
    }

    #[test]
    fn widgets_response_tolerates_missing_fields() {
        let response: WidgetsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.widgets.is_empty());
        assert!(response.session_id.is_none());
        assert!(!response.enabled_gdpr);
    }

    #[test]
    fn widget_decodes_wire_shape() {
        let json = r#"{
            "id": "w1",
            "type": "popup",
            "expiry": "2030-01-01T00:00:00Z",
            "is_gdpr": true,
            "html": "<div></div>"
        }"#;
        let widget: Widget = serde_json::from_str(json).unwrap();
        assert_eq!(widget.id, "w1");
        assert_eq!(widget.widget_type, WidgetType::Popup);
        assert!(widget.expiry.is_some());
        assert!(widget.is_gdpr);
    }

    #[test]
    fn widget_type_rejects_unknown() {
        let result: Result<WidgetType, _> = serde_json::from_str(r#""wheel""#);
        assert!(result.is_err());
    }

    #[test]
    fn view_config_serializes_camel_case() {
        let config = WidgetViewConfig {
            token: "t".into(),
            endpoint: "https://capture.example.com".into(),
            capture_js_url: "https://cdn.example.com/capture.js".into(),
            data: WidgetsResponse::default(),
            context: std::collections::HashMap::new(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("captureJsUrl").is_some());
        assert!(json.get("capture_js_url").is_none());
    }

    #[test]
    fn widget_id_display_and_from() {
        let id = WidgetId::from("w42");
        assert_eq!(id.to_string(), "w42");
        assert_eq!(id.as_str(), "w42");
    }
}
