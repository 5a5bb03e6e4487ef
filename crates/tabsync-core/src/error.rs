//! Error types for tabsync-core

use thiserror::Error;

/// Result type alias using tabsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session not found
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Import payload does not parse for its declared format
    #[error("Malformed {format} import: {reason}")]
    MalformedImport {
        format: &'static str,
        reason: String,
    },

    /// Unknown export/import format name
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Window/tab source failure
    #[error("Window source error: {0}")]
    Window(String),
}
