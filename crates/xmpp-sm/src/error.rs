//! Error types for the manager.

use thiserror::Error;
use xmpp_sm_engine::EngineError;
use xmpp_sm_store::StoreError;

/// Errors that can occur during Stream Management operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Engine error.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Storage error, raised while restoring a session.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, Error>;
