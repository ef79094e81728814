//! Error types for the license lifecycle.

use keygate_store::StoreError;
use thiserror::Error;

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No record exists for the key.
    #[error("license not found")]
    NotFound,

    /// The record is revoked (`active` is false).
    #[error("license revoked")]
    Revoked,

    /// The record's expiry lies in the past.
    #[error("license has expired")]
    Expired,

    /// The key was already redeemed by a different identity.
    #[error("license already redeemed by another owner")]
    AlreadyClaimedByOther,

    /// The key was already redeemed by this identity.
    #[error("license already redeemed by this owner")]
    AlreadyClaimedBySelf,

    /// The operation requires a redeemed license.
    #[error("license has not been redeemed")]
    NotRedeemed,

    /// The authoritative write failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
