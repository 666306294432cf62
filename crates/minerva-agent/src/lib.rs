// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent orchestration for the Minerva service.
//!
//! Provides the per-request [`ChatMemoryWindow`], the tool-calling
//! [`AgentRunner`], and the typed [`TurnEvent`]s plus segmenter that feed
//! the stream adapter.

pub mod events;
pub mod memory;
pub mod runner;

pub use events::{segment, TurnEvent, SEGMENT_PACING};
pub use memory::ChatMemoryWindow;
pub use runner::{AgentRunner, TurnOutcome, EMPTY_OUTPUT_FALLBACK, STEP_CAP_APOLOGY};
