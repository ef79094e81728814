//! Owner partitioning — per-owner projections of the license map.

use keygate_types::{LicenseMap, OwnerId};
use std::collections::BTreeMap;

/// Per-owner projection of the authoritative map.
pub type OwnerSubsets = BTreeMap<OwnerId, LicenseMap>;

/// Splits the authoritative map into one subset per owning identity.
///
/// Records without an owner appear in no subset. The result is a pure
/// function of `map`; recomputing it after every write keeps each subset
/// exactly equal to the authoritative filter for that owner.
#[must_use]
pub fn partition_by_owner(map: &LicenseMap) -> OwnerSubsets {
    let mut subsets = OwnerSubsets::new();
    for (key, record) in map {
        if let Some(owner) = &record.owner_id {
            subsets
                .entry(owner.clone())
                .or_default()
                .insert(key.clone(), record.clone());
        }
    }
    subsets
}
