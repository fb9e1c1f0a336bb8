// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presentation surface abstraction (the host application's key window).

use async_trait::async_trait;

use crate::error::NudgeError;

/// The visual container a widget's content host is attached to.
///
/// Exclusively owned by the currently active presentation; the scheduler
/// never presents on a surface while another presentation holds the gate.
#[async_trait]
pub trait PresentationSurface: Send + Sync {
    /// Whether a surface can currently be located (a key window exists).
    fn is_available(&self) -> bool;

    /// Attaches and presents the content host's container.
    async fn present(&self) -> Result<(), NudgeError>;

    /// Detaches and dismisses the container. Idempotent.
    async fn dismiss(&self);
}
