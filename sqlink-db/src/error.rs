// SPDX-License-Identifier: MIT

//! Error types for bridge database operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for bridge database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening, querying, or closing the database.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to attach the scratch database to a handle
    #[error("Failed to attach scratch database at '{path}': {source}")]
    ScratchAttach {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to create a temporary scratch database file
    #[error("Failed to create scratch database: {0}")]
    ScratchCreate(#[source] std::io::Error),

    /// A request parameter has no SQLite representation
    #[error("Cannot bind parameter {index}: {reason}")]
    UnbindableParameter { index: usize, reason: String },

    /// Failed to close a handle during shutdown
    #[error("Failed to close database handle: {0}")]
    Close(#[source] rusqlite::Error),
}
