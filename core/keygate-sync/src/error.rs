//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur when talking to the remote mirror.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The mirror could not be reached, or the request ran past its
    /// deadline.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The shared upload secret was rejected.
    #[error("unauthorized: upload secret rejected")]
    Unauthorized,

    /// The mirror answered with an unexpected status.
    #[error("remote rejected request: status {status}")]
    Rejected {
        /// HTTP status code returned by the mirror.
        status: u16,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
