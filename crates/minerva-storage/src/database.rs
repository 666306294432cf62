// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access goes through tokio-rusqlite's single background thread; do not
//! create additional `Connection` instances for the same file.

use minerva_core::MinervaError;
use tokio_rusqlite::Connection;
use tracing::info;

/// Handle to the SQLite conversation database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database at `path`, enables WAL mode, and runs
    /// any pending migrations.
    pub async fn open(path: &str) -> Result<Self, MinervaError> {
        let conn = Connection::open(path).await.map_err(map_tr_err)?;

        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            crate::migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path, "conversation database ready");

        Ok(Self { conn })
    }

    /// The underlying serialized connection, for the query modules.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the background connection thread.
    pub async fn close(self) -> Result<(), MinervaError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Maps a tokio-rusqlite error into the shared storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> MinervaError {
    MinervaError::Storage {
        source: Box::new(e),
    }
}

/// Wraps a migration failure for propagation through the `call` closure.
#[derive(Debug)]
pub(crate) struct MigrationFailure(pub String);

impl std::fmt::Display for MigrationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "migration failed: {}", self.0)
    }
}

impl std::error::Error for MigrationFailure {}
