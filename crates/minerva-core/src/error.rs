// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Minerva question-answering service.

use thiserror::Error;

/// The primary error type used across all Minerva crates.
#[derive(Debug, Error)]
pub enum MinervaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The request itself is unusable (blank message, repeatedly malformed tool arguments).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No session-bound user id was presented.
    #[error("unauthenticated request")]
    Unauthenticated,

    /// A file tool was asked to resolve a path outside its allowed directory.
    #[error("path escapes allowed directory: {path}")]
    PathEscape { path: String },

    /// A chat-model call exceeded its configured deadline.
    #[error("provider timed out after {seconds}s")]
    ProviderTimeout { seconds: u64 },

    /// The provider rejected the request (auth, schema, unknown model).
    #[error("provider rejected request: {message}")]
    ProviderRejected { message: String },

    /// Embedding-model or vector-store backend failure.
    #[error("vector backend error: {message}")]
    VectorBackend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The agent loop hit its iteration bound.
    #[error("agent loop exceeded {cap} steps")]
    StepCapExceeded { cap: u32 },

    /// Conversation-store failure (connection, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MinervaError {
    /// Whether a provider error is worth retrying by a caller that chooses to.
    ///
    /// Timeouts are transient; rejections (auth, schema) are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MinervaError::ProviderTimeout { .. })
    }
}
