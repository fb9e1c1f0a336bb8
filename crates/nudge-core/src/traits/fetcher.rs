// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Widget fetcher boundary to the backend marketing API.

use async_trait::async_trait;

use crate::error::NudgeError;
use crate::types::{WidgetsRequest, WidgetsResponse};

/// Fetches widget definitions by session/contact from the backend.
///
/// The core only consumes the response shape; transport, authentication,
/// and retry policy live behind this boundary.
#[async_trait]
pub trait WidgetFetcher: Send + Sync {
    async fn fetch(&self, request: &WidgetsRequest) -> Result<WidgetsResponse, NudgeError>;
}
