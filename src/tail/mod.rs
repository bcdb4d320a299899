// SPDX-License-Identifier: Apache-2.0

//! Source discovery and lifecycle orchestration.

mod gauge;
mod options;
pub(crate) mod pattern;
mod tailer;

pub use gauge::SourceGauge;
pub use options::{TailerOption, DEFAULT_STALE_AFTER};
pub use tailer::Tailer;
