//! Owner partitioning and mirror synchronization for Keygate.
//!
//! The authoritative license map lives in a local flat file; this crate
//! derives the per-owner projections of that map and pushes them to the
//! remote mirror service so owners can be looked up externally.
//!
//! # Consistency contract
//!
//! - Partitioning is a pure, full recomputation over the authoritative
//!   map: after every authoritative write the subsets equal exactly the
//!   filter of the store by each owning identity.
//! - Pushes are best-effort and eventually consistent. The authoritative
//!   write is durable before a push is attempted, each mutation triggers
//!   exactly one push attempt, and a failed push is logged, never
//!   propagated to the mutation that triggered it.
//! - One owner's failed push never blocks or rolls back the others.

mod client;
mod dispatch;
mod error;
pub mod partition;

pub use client::{HealthReport, MirrorClient, MirrorConfig, PushSummary, UploadAck};
pub use dispatch::MirrorSync;
pub use error::{SyncError, SyncResult};
pub use partition::{partition_by_owner, OwnerSubsets};
