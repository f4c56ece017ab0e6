//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while persisting or loading snapshots.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Snapshot encoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] xmpp_sm_core::CoreError),

    /// A caller-supplied hook reported a failure.
    #[error("persistence hook failed: {0}")]
    Hook(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
