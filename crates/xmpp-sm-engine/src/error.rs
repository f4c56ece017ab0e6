//! Error types for the engine.

use thiserror::Error;

/// Errors that can occur during Stream Management operations.
///
/// Protocol-level refusals (`<failed/>`) are not errors; they arrive as
/// input to [`StreamManagement::failed`](crate::StreamManagement::failed).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The persistence hook failed.
    #[error("store error: {0}")]
    Store(#[from] xmpp_sm_store::StoreError),

    /// The connection could not send.
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// `resume()` was called with no session id to resume.
    #[error("no session to resume")]
    NoSession,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
