//! License records, duration kinds, and the expiry sentinel.

use crate::ids::{HardwareId, LicenseKey, OwnerId};
use chrono::{DateTime, Duration, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The authoritative mapping from license key to record.
///
/// A `BTreeMap` so the stored JSON and every mirrored subset serialize in
/// a stable key order.
pub type LicenseMap = BTreeMap<LicenseKey, LicenseRecord>;

/// Fixed set of license durations.
///
/// `SevenDays` and `OneWeek` are distinct wire tokens with the same day
/// count; both existed in the issuing vocabulary and stored records may
/// carry either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DurationKind {
    #[serde(rename = "1DAY")]
    OneDay,
    #[serde(rename = "3DAYS")]
    ThreeDays,
    #[serde(rename = "7DAYS")]
    SevenDays,
    #[serde(rename = "1WEEK")]
    OneWeek,
    #[serde(rename = "1MONTH")]
    OneMonth,
    #[serde(rename = "LIFETIME")]
    Lifetime,
}

impl DurationKind {
    /// Returns the validity period in days, or `None` for lifetime keys.
    #[must_use]
    pub fn days(self) -> Option<i64> {
        match self {
            Self::OneDay => Some(1),
            Self::ThreeDays => Some(3),
            Self::SevenDays | Self::OneWeek => Some(7),
            Self::OneMonth => Some(30),
            Self::Lifetime => None,
        }
    }

    /// Wire token used in stored records and embedded in generated keys.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::OneDay => "1DAY",
            Self::ThreeDays => "3DAYS",
            Self::SevenDays => "7DAYS",
            Self::OneWeek => "1WEEK",
            Self::OneMonth => "1MONTH",
            Self::Lifetime => "LIFETIME",
        }
    }
}

impl fmt::Display for DurationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when parsing an unknown duration token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown duration kind: {0}")]
pub struct ParseDurationKindError(pub String);

impl FromStr for DurationKind {
    type Err = ParseDurationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1DAY" => Ok(Self::OneDay),
            "3DAYS" => Ok(Self::ThreeDays),
            "7DAYS" => Ok(Self::SevenDays),
            "1WEEK" => Ok(Self::OneWeek),
            "1MONTH" => Ok(Self::OneMonth),
            "LIFETIME" => Ok(Self::Lifetime),
            other => Err(ParseDurationKindError(other.to_string())),
        }
    }
}

/// Expiration marker for a redeemed license.
///
/// Serialized as a JSON string: the `"never"` sentinel for lifetime keys,
/// an RFC 3339 instant otherwise. Stored strings that parse as neither are
/// kept as [`Expiry::Unparsed`]; they impose no expiry constraint and
/// round-trip unchanged rather than failing the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    /// Lifetime sentinel, exempt from expiry comparison.
    Never,
    /// Absolute expiration instant.
    At(DateTime<Utc>),
    /// A stored value that is not a valid timestamp; no expiry constraint.
    Unparsed(String),
}

impl Expiry {
    /// Serialized form of the lifetime sentinel.
    pub const NEVER_TOKEN: &'static str = "never";

    /// Computes the expiry for a license of `kind` redeemed at
    /// `redeemed_at`. Computed exactly once, at redemption.
    #[must_use]
    pub fn from_kind(kind: DurationKind, redeemed_at: DateTime<Utc>) -> Self {
        match kind.days() {
            Some(days) => Self::At(redeemed_at + Duration::days(days)),
            None => Self::Never,
        }
    }

    /// Returns true if this expiry lies in the past relative to `now`.
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::At(instant) => now > *instant,
            Self::Never | Self::Unparsed(_) => false,
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str(Self::NEVER_TOKEN),
            Self::At(instant) => f.write_str(&instant.to_rfc3339()),
            Self::Unparsed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Never => serializer.serialize_str(Self::NEVER_TOKEN),
            Self::At(instant) => serializer.serialize_str(&instant.to_rfc3339()),
            Self::Unparsed(raw) => serializer.serialize_str(raw),
        }
    }
}

struct ExpiryVisitor;

impl Visitor<'_> for ExpiryVisitor {
    type Value = Expiry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"never\" or an RFC 3339 timestamp string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Expiry, E> {
        if value == Expiry::NEVER_TOKEN {
            return Ok(Expiry::Never);
        }
        match DateTime::parse_from_rfc3339(value) {
            Ok(instant) => Ok(Expiry::At(instant.with_timezone(&Utc))),
            Err(_) => Ok(Expiry::Unparsed(value.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ExpiryVisitor)
    }
}

/// One license record, keyed by its [`LicenseKey`] in the authoritative
/// map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Duration kind the key was issued with.
    #[serde(rename = "type")]
    pub kind: DurationKind,
    /// Whether the key has been redeemed.
    #[serde(default)]
    pub redeemed: bool,
    /// Identity that redeemed the key. Set exactly once, at redemption.
    #[serde(default)]
    pub owner_id: Option<OwnerId>,
    /// Hardware binding token, written by the external hardware check.
    #[serde(default)]
    pub hardware_id: Option<HardwareId>,
    /// Revocation flag. Records loaded without it count as active.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Liveness flag, presentation only.
    #[serde(default)]
    pub online: bool,
    /// Absolute expiry, computed once at redemption. Absent until then.
    #[serde(default)]
    pub expires: Option<Expiry>,
    /// When the key was redeemed.
    #[serde(default)]
    pub redeemed_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl LicenseRecord {
    /// A freshly issued record: active, unredeemed, no owner, no expiry.
    #[must_use]
    pub fn issued(kind: DurationKind) -> Self {
        Self {
            kind,
            redeemed: false,
            owner_id: None,
            hardware_id: None,
            active: true,
            online: false,
            expires: None,
            redeemed_at: None,
        }
    }

    /// Returns true if the stored expiry lies in the past relative to
    /// `now`. Records without an expiry never count as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.as_ref().is_some_and(|e| e.is_past(now))
    }

    /// Returns true if this record was redeemed by `owner`.
    #[must_use]
    pub fn owned_by(&self, owner: &OwnerId) -> bool {
        self.owner_id.as_ref() == Some(owner)
    }
}
