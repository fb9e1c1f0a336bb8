// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock widget fetcher with scripted responses and captured requests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use nudge_core::{NudgeError, WidgetFetcher, WidgetsRequest, WidgetsResponse};

/// A mock [`WidgetFetcher`].
///
/// Returns the configured response (or a scripted API failure), optionally
/// after a simulated network delay, and records every request for
/// assertion.
pub struct MockFetcher {
    response: Mutex<Result<WidgetsResponse, String>>,
    delay: Mutex<Duration>,
    requests: Mutex<Vec<WidgetsRequest>>,
}

impl MockFetcher {
    /// A fetcher that always succeeds with `response`.
    pub fn with_response(response: WidgetsResponse) -> Self {
        Self {
            response: Mutex::new(Ok(response)),
            delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A fetcher that always fails with an API error.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Mutex::new(Err(message.to_string())),
            delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the scripted response.
    pub fn set_response(&self, response: WidgetsResponse) {
        *self.response.lock().expect("mock poisoned") = Ok(response);
    }

    /// Adds a simulated network delay before each response.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("mock poisoned") = delay;
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<WidgetsRequest> {
        self.requests.lock().expect("mock poisoned").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("mock poisoned").len()
    }
}

#[async_trait]
impl WidgetFetcher for MockFetcher {
    async fn fetch(&self, request: &WidgetsRequest) -> Result<WidgetsResponse, NudgeError> {
        self.requests
            .lock()
            .expect("mock poisoned")
            .push(request.clone());

        let delay = *self.delay.lock().expect("mock poisoned");
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        match &*self.response.lock().expect("mock poisoned") {
            Ok(response) => Ok(response.clone()),
            Err(message) => Err(NudgeError::Api {
                message: message.clone(),
                source: None,
            }),
        }
    }
}
