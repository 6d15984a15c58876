use countdown_shared::{CountdownError, InterchangeError};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (directory creation, projection writes).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Projection (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The record breaks a model invariant.
    #[error("Invalid countdown: {0}")]
    Invalid(#[from] CountdownError),

    /// A share link could not be imported. The inner error keeps the
    /// invalid-link / unreadable-payload distinction.
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
