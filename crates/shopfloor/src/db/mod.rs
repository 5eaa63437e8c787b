//! SQLite persistence behind [`SqliteBackend`](crate::store::SqliteBackend).
//!
//! The engine is single-writer, so one connection per process is enough.
//! Each store call holds the connection lock for one statement or one
//! read-apply-write cycle. Timestamps are RFC 3339 text.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub mod alert_repo;
pub mod error;
pub mod event_repo;
pub mod job_repo;
pub mod machine_repo;
pub mod message_repo;
pub mod migrations;
pub mod project_repo;

pub use error::DatabaseError;

/// Handle to the shop database. Clones share the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the shop database file, creating it and its directory if
    /// needed, and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| DatabaseError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        // Dashboards refresh while operators report; WAL keeps readers off the writer.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self::migrated(conn)?;
        log::info!("Shop database ready at {}", path.display());
        Ok(db)
    }

    /// A throwaway database with the full schema.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let applied = migrations::run_all(&conn)?;
        if applied > 0 {
            log::info!("Applied {} schema migration(s)", applied);
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DatabaseError::ConnectionPoisoned)?;
        f(&conn)
    }
}

/// `~/.shopfloor/data/shopfloor.db`, or `None` without a home directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".shopfloor").join("data").join("shopfloor.db"))
}

pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Unparseable timestamps read as the Unix epoch, with a warning.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("Unreadable timestamp '{}' in shop database: {}", s, e);
            DateTime::<Utc>::default()
        })
}
