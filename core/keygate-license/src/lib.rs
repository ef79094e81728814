//! License lifecycle for Keygate.
//!
//! Implements the key state machine: issue → redeem → expire/revoke, with
//! bulk hold/resume, hardware-binding reset, and full purge. Every
//! operation is a whole-map read-modify-write against the flat-file
//! store; after each successful write the per-owner subsets are
//! recomputed and a best-effort mirror push is dispatched in the
//! background.
//!
//! # Redemption entry points
//!
//! There are two deliberately distinct ways to claim a key:
//!
//! - [`LicenseService::redeem`] — interactive path. A key the same owner
//!   already claimed is rejected with
//!   [`LifecycleError::AlreadyClaimedBySelf`] so duplicate submissions
//!   surface to the caller.
//! - [`LicenseService::verify`] — non-interactive path. The same case
//!   succeeds idempotently, so tooling can re-check a key it holds.
//!
//! They are otherwise identical and must stay that way; calling code
//! depends on the difference.

mod error;
mod keygen;
mod service;

pub use error::{LifecycleError, LifecycleResult};
pub use keygen::KeyGenerator;
pub use service::{LicenseService, LicenseSnapshot, RedeemReceipt, StoreStats};
