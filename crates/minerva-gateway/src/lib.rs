// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Minerva QA service.
//!
//! Exposes the streaming endpoint (`POST /agent/stream`, Server-Sent
//! Events) and the history/conversations endpoints, all gated on a
//! session-bound user id provided by an external collaborator.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod sse;

pub use auth::{HeaderSessionAuth, SessionAuth};
pub use server::{build_router, start_server, AppState, TurnSettings};
pub use sse::{run_turn, StreamRequest};
