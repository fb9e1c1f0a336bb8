// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Nudge widget SDK.
//!
//! Layered loading (compiled defaults, TOML file, `NUDGE_*` environment
//! variables) plus validation/normalization of the extracted model.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CaptureConfig, NudgeConfig, WidgetConfig};
pub use validation::validate;
