// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Widget presentation core for the Nudge in-app widget SDK.
//!
//! This crate owns the logic between "the backend asked us to show widget
//! X" and "the widget is on screen": the durable [`WidgetQueue`], the
//! single-visibility [`PresentationGate`], the content-host
//! [`WidgetHandshake`], and the [`WidgetScheduler`] that orchestrates them
//! over the collaborator traits from `nudge-core`.

pub mod context;
pub mod gate;
pub mod handshake;
pub mod prefs;
pub mod queue;
pub mod scheduler;

pub use gate::PresentationGate;
pub use handshake::{HandshakeState, WidgetBundle, WidgetHandshake};
pub use prefs::{JsonFileStore, SessionStore};
pub use queue::WidgetQueue;
pub use scheduler::WidgetScheduler;
