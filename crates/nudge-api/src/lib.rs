// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Nudge widgets endpoint.

pub mod client;

pub use client::CaptureClient;
