// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business-type classification and model routing for the Minerva service.
//!
//! This crate provides:
//! - [`BusinessTypeDetector`]: deterministic first-match-wins keyword rules
//! - [`ModelRouter`]: strategy-driven model selection (percentage split or
//!   business-type mapping) producing a [`minerva_core::RoutingDecision`]
//!
//! The router never fails a request over model availability; it substitutes
//! the local model and reports the substitution in the decision.

pub mod classifier;
pub mod router;

pub use classifier::BusinessTypeDetector;
pub use router::{ModelRouter, RouterStrategy};
