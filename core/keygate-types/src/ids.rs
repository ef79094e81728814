//! Identifier types used throughout the Keygate core.
//!
//! All three are opaque string newtypes with transparent serde, so they
//! appear as plain strings in stored JSON and as map keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque license key token, e.g. `KG-7DAYS-X4Q9TZ`.
///
/// Keys are generated with a high-entropy random suffix and never reused.
/// Ordered so the authoritative map serializes deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Wraps a raw key token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LicenseKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for LicenseKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Identity of the account that owns (redeemed) a license.
///
/// In the original deployment this is a chat-platform account id; the core
/// treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wraps a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for OwnerId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Hardware binding token associated with a redeemed license.
///
/// Written by the external hardware check; the core only stores and clears
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareId(String);

impl HardwareId {
    /// Wraps a raw binding token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HardwareId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for HardwareId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
