// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the widgets endpoint of the marketing API.
//!
//! Provides [`CaptureClient`] which handles request construction, JSON
//! headers, and transient error retry. Implements the
//! [`WidgetFetcher`] boundary consumed by the widget scheduler.

use std::time::Duration;

use async_trait::async_trait;
use nudge_core::{NudgeError, WidgetFetcher, WidgetsRequest, WidgetsResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

/// Path of the widgets endpoint, relative to the account's API host.
const WIDGETS_PATH: &str = "/-/widgets/get";

/// HTTP client for widget definition fetches.
///
/// Manages JSON headers, connection pooling, and retry logic for transient
/// errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct CaptureClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl CaptureClient {
    /// Creates a new widgets API client for the given API host.
    ///
    /// `base_url` is the normalized endpoint without trailing slash, e.g.
    /// `https://capture-api.example.com`.
    pub fn new(base_url: String) -> Result<Self, NudgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NudgeError::Api {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            max_retries: 1,
        })
    }

    fn widgets_url(&self) -> String {
        format!("{}{WIDGETS_PATH}", self.base_url)
    }

    /// Sends a widgets request and returns the decoded response.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second
    /// delay.
    pub async fn fetch_widgets(
        &self,
        request: &WidgetsRequest,
    ) -> Result<WidgetsResponse, NudgeError> {
        let url = self.widgets_url();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying widgets request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| NudgeError::Api {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "widgets response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| NudgeError::Api {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let widgets: WidgetsResponse =
                    serde_json::from_str(&body).map_err(|e| NudgeError::Api {
                        message: format!("failed to parse widgets response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(widgets);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(NudgeError::Api {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            return Err(NudgeError::Api {
                message: format!("API returned {status}: {body}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| NudgeError::Api {
            message: "widgets request failed after retries".into(),
            source: None,
        }))
    }
}

#[async_trait]
impl WidgetFetcher for CaptureClient {
    async fn fetch(&self, request: &WidgetsRequest) -> Result<WidgetsResponse, NudgeError> {
        self.fetch_widgets(request).await
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> WidgetsRequest {
        WidgetsRequest::new(Some("sess-1".into()), "app-key".into())
    }

    fn widgets_body() -> serde_json::Value {
        serde_json::json!({
            "widgets": [
                {"id": "w1", "type": "popup", "expiry": null},
                {"id": "w2", "type": "bar"}
            ],
            "has_logo": true,
            "enabled_gdpr": false,
            "country_code": "AU",
            "cdn_url": "https://cdn.example.com",
            "session_id": "sess-2"
        })
    }

    #[tokio::test]
    async fn fetch_widgets_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(widgets_body()))
            .mount(&server)
            .await;

        let client = CaptureClient::new(server.uri()).unwrap();
        let response = client.fetch_widgets(&test_request()).await.unwrap();

        assert_eq!(response.widgets.len(), 2);
        assert_eq!(response.session_id.as_deref(), Some("sess-2"));
        assert!(response.has_logo);
    }

    #[tokio::test]
    async fn fetch_widgets_sends_short_wire_keys() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .and(body_partial_json(serde_json::json!({
                "s": "sess-1",
                "h": "app-key"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(widgets_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaptureClient::new(server.uri()).unwrap();
        let result = client.fetch_widgets(&test_request()).await;
        assert!(result.is_ok(), "body should match: {result:?}");
    }

    #[tokio::test]
    async fn fetch_widgets_retries_on_503() {
        let server = MockServer::start().await;

        // First request returns 503, second returns 200.
        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(widgets_body()))
            .mount(&server)
            .await;

        let client = CaptureClient::new(server.uri()).unwrap();
        let response = client.fetch_widgets(&test_request()).await.unwrap();
        assert_eq!(response.widgets.len(), 2);
    }

    #[tokio::test]
    async fn fetch_widgets_fails_on_400() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaptureClient::new(server.uri()).unwrap();
        let err = client.fetch_widgets(&test_request()).await.unwrap_err();
        assert!(err.is_transient(), "API errors are the transient class");
        assert!(err.to_string().contains("400"), "got: {err}");
    }

    #[tokio::test]
    async fn fetch_widgets_exhausts_retries_on_500() {
        let server = MockServer::start().await;

        // Both attempts return 500.
        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client = CaptureClient::new(server.uri()).unwrap();
        let result = client.fetch_widgets(&test_request()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fetch_widgets_rejects_undecodable_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/-/widgets/get"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = CaptureClient::new(server.uri()).unwrap();
        let err = client.fetch_widgets(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("parse"), "got: {err}");
    }
}
