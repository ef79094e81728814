//! Core type definitions for Keygate.
//!
//! Everything that crosses a crate boundary lives here: the identifier
//! newtypes, the duration vocabulary, the expiry sentinel, and the license
//! record itself. This crate does no I/O.

mod ids;
mod record;

pub use ids::{HardwareId, LicenseKey, OwnerId};
pub use record::{DurationKind, Expiry, LicenseMap, LicenseRecord, ParseDurationKindError};
