// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Minerva question-answering service.
//!
//! Provides the shared error type and the domain types that cross crate
//! boundaries: stored messages, vector segments, tool-call records, and
//! routing decisions. Subsystem crates depend on this one and never on
//! each other's internals.

pub mod error;
pub mod types;

pub use error::MinervaError;
pub use types::{
    BusinessType, NewMessage, ProviderKind, Role, RoutingDecision, SegmentMetadata,
    StoredMessage, ToolCallRecord, ToolCallStatus, VectorSegment,
    AGENT_CONVERSATION_PREFIX, CHAT_CONVERSATION_PREFIX,
};
