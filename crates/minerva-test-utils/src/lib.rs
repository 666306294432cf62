// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Minerva: a scripted chat provider, in-memory retrieval
//! backends, and a temp-database helper.

pub mod mock_provider;
pub mod mock_retrieval;

pub use mock_provider::MockProvider;
pub use mock_retrieval::{FixedEmbedder, MemoryVectorIndex};

use minerva_storage::Database;

/// Opens a fresh migrated SQLite database in a temp directory.
///
/// The returned `TempDir` must be kept alive for the database's lifetime.
pub async fn temp_database() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("minerva-test.db");
    let db = Database::open(path.to_str().expect("utf-8 path"))
        .await
        .expect("open temp database");
    (db, dir)
}
