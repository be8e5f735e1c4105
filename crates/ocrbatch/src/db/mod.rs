//! Audit log persistence on SQLite.
//!
//! One connection per process, shared behind a `Mutex`. Schema changes are
//! applied by `migrations::run_all` when the database is opened.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod migrations;
pub mod upload_log_repo;

pub use error::DatabaseError;
pub use upload_log_repo::{UploadLog, UploadStatus};

/// Shared handle to the audit database.
///
/// Clones point at the same connection; the batch runner and the admin
/// routes each hold one. Opened in WAL mode.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// Closes the connection. Fails if any clone of this handle is still alive.
    pub fn close(self) -> Result<(), DatabaseError> {
        let mutex = Arc::try_unwrap(self.conn)
            .map_err(|arc| DatabaseError::InUse(Arc::strong_count(&arc) - 1))?;
        let conn = mutex.into_inner().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e))?;

        log::info!("Database closed");
        Ok(())
    }
}
