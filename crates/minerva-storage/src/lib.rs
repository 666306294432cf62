// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite conversation store for the Minerva service.
//!
//! Append-only message log with conversation-scoped reads and a two-row
//! turn transaction. All access is serialized through a single background
//! connection; the model call never runs inside a transaction.

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::Database;
pub use queries::messages::{
    append, append_turn, conversations_for, delete_conversation, history, tail,
};
