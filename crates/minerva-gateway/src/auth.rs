// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-auth seam.
//!
//! Authentication itself is an external collaborator; the gateway consumes
//! exactly one method: resolve the current request to a user id, or reject.
//! Absence of a user id yields HTTP 401 before any streaming begins.

use axum::http::HeaderMap;

/// Resolves a request to the session-bound user id.
pub trait SessionAuth: Send + Sync {
    /// The user id for this request, or `None` when unauthenticated.
    fn current_user_id(&self, headers: &HeaderMap) -> Option<String>;
}

/// Reads the user id a fronting session layer injects into a header.
pub struct HeaderSessionAuth {
    header: &'static str,
}

impl HeaderSessionAuth {
    pub fn new() -> Self {
        Self { header: "x-user-id" }
    }
}

impl Default for HeaderSessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAuth for HeaderSessionAuth {
    fn current_user_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    }
}
