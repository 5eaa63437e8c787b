//! Failures of the SQLite store backend.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot open shop database at '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot create database directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema migration failed; the version is not recorded as applied.
    #[error("Migration v{version} ({description}) failed: {source}")]
    Migration {
        version: u32,
        description: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Refusing to inspect table with invalid name '{table}'")]
    InvalidTableName { table: String },

    /// A thread panicked while holding the connection.
    #[error("Shop database connection poisoned")]
    ConnectionPoisoned,
}
