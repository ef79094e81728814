//! License lifecycle operations over the authoritative store.
//!
//! Every operation is a whole-map read-modify-write: load the store,
//! apply the change, replace the file. A single logical writer is
//! assumed; concurrent writers would race on the load/save cycle
//! (lost-update hazard). Deployments with multiple writers need their own
//! mutual exclusion around each operation.

use crate::error::{LifecycleError, LifecycleResult};
use crate::keygen::KeyGenerator;
use chrono::{DateTime, Utc};
use keygate_store::JsonFileStore;
use keygate_sync::{partition_by_owner, MirrorSync};
use keygate_types::{
    DurationKind, Expiry, HardwareId, LicenseKey, LicenseMap, LicenseRecord, OwnerId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Read-only view of a record, as returned by [`LicenseService::inspect`].
///
/// Carries the fields relevant for display; the hardware binding is not
/// part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseSnapshot {
    pub kind: DurationKind,
    pub redeemed: bool,
    pub owner_id: Option<OwnerId>,
    pub active: bool,
    pub online: bool,
    pub expires: Option<Expiry>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl From<&LicenseRecord> for LicenseSnapshot {
    fn from(record: &LicenseRecord) -> Self {
        Self {
            kind: record.kind,
            redeemed: record.redeemed,
            owner_id: record.owner_id.clone(),
            active: record.active,
            online: record.online,
            expires: record.expires.clone(),
            redeemed_at: record.redeemed_at,
        }
    }
}

/// Details of a successful redemption or verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedeemReceipt {
    pub key: LicenseKey,
    pub kind: DurationKind,
    pub owner_id: OwnerId,
    pub expires: Expiry,
    pub redeemed_at: Option<DateTime<Utc>>,
}

/// Aggregate counts over the store, for status displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub redeemed: usize,
    pub available: usize,
    pub by_kind: BTreeMap<DurationKind, usize>,
}

/// The license lifecycle service.
///
/// Owns the authoritative store and, optionally, a mirror synchronizer.
/// The lifecycle is fully functional without a mirror; with one, every
/// successful write dispatches a background push of the recomputed owner
/// subsets.
#[derive(Debug, Clone)]
pub struct LicenseService {
    store: JsonFileStore,
    keygen: KeyGenerator,
    mirror: Option<MirrorSync>,
}

impl LicenseService {
    /// Creates a service over `store`, with the default key prefix and no
    /// mirror.
    pub fn new(store: JsonFileStore) -> Self {
        Self {
            store,
            keygen: KeyGenerator::default(),
            mirror: None,
        }
    }

    /// Replaces the key generator.
    #[must_use]
    pub fn with_keygen(mut self, keygen: KeyGenerator) -> Self {
        self.keygen = keygen;
        self
    }

    /// Enables background mirror pushes after every authoritative write.
    ///
    /// Pushes run on the Tokio runtime; construct the service inside one
    /// when a mirror is configured.
    #[must_use]
    pub fn with_mirror(mut self, mirror: MirrorSync) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Issues a fresh key of the given kind.
    ///
    /// The new record is active, unredeemed, and has no owner or expiry.
    pub fn issue(&self, kind: DurationKind) -> LifecycleResult<LicenseKey> {
        let mut map = self.store.load();
        let key = self.keygen.generate(kind);
        map.insert(key.clone(), LicenseRecord::issued(kind));
        self.commit(map)?;
        info!(key = %key, kind = %kind, "license issued");
        Ok(key)
    }

    /// Looks up a key without mutating state.
    ///
    /// Fails with [`LifecycleError::NotFound`] for unknown keys, and with
    /// [`LifecycleError::Revoked`] or [`LifecycleError::Expired`] for
    /// records that exist but are unusable. The lifetime sentinel and
    /// unparsable stored expiries are exempt from the expiry comparison.
    pub fn inspect(&self, key: &LicenseKey) -> LifecycleResult<LicenseSnapshot> {
        let map = self.store.load();
        let record = map.get(key).ok_or(LifecycleError::NotFound)?;
        if !record.active {
            return Err(LifecycleError::Revoked);
        }
        if record.is_expired(Utc::now()) {
            return Err(LifecycleError::Expired);
        }
        Ok(LicenseSnapshot::from(record))
    }

    /// Redeems `key` for `owner`.
    ///
    /// A key already redeemed by the same owner is rejected with
    /// [`LifecycleError::AlreadyClaimedBySelf`]; [`Self::verify`] is the
    /// idempotent variant. A key redeemed by anyone else is rejected with
    /// [`LifecycleError::AlreadyClaimedByOther`] for the lifetime of the
    /// key.
    pub fn redeem(&self, key: &LicenseKey, owner: &OwnerId) -> LifecycleResult<RedeemReceipt> {
        let mut map = self.store.load();
        let record = map.get_mut(key).ok_or(LifecycleError::NotFound)?;
        if !record.active {
            return Err(LifecycleError::Revoked);
        }
        if record.redeemed {
            return Err(if record.owned_by(owner) {
                LifecycleError::AlreadyClaimedBySelf
            } else {
                LifecycleError::AlreadyClaimedByOther
            });
        }

        claim(record, owner, Utc::now());
        let receipt = receipt_for(record, key, owner);
        self.commit(map)?;
        info!(key = %key, owner = %owner, "license redeemed");
        Ok(receipt)
    }

    /// Verifies `key` for `owner`, claiming it if still unclaimed.
    ///
    /// Identical to [`Self::redeem`] except that a key already redeemed
    /// by the same owner succeeds without writing, so non-interactive
    /// callers can re-check a key they hold.
    pub fn verify(&self, key: &LicenseKey, owner: &OwnerId) -> LifecycleResult<RedeemReceipt> {
        let mut map = self.store.load();
        let record = map.get_mut(key).ok_or(LifecycleError::NotFound)?;
        if !record.active {
            return Err(LifecycleError::Revoked);
        }
        if record.redeemed {
            if record.owned_by(owner) {
                debug!(key = %key, owner = %owner, "license verified");
                return Ok(receipt_for(record, key, owner));
            }
            return Err(LifecycleError::AlreadyClaimedByOther);
        }

        claim(record, owner, Utc::now());
        let receipt = receipt_for(record, key, owner);
        self.commit(map)?;
        info!(key = %key, owner = %owner, "license verified and claimed");
        Ok(receipt)
    }

    /// Puts every license on hold. Held licenses reject redemption and
    /// verification until [`Self::resume_all`] runs.
    pub fn hold_all(&self) -> LifecycleResult<usize> {
        self.set_all_active(false)
    }

    /// Reactivates every license.
    pub fn resume_all(&self) -> LifecycleResult<usize> {
        self.set_all_active(true)
    }

    fn set_all_active(&self, active: bool) -> LifecycleResult<usize> {
        let mut map = self.store.load();
        for record in map.values_mut() {
            record.active = active;
        }
        let count = map.len();
        self.commit(map)?;
        info!(count, active, "bulk active-flag update");
        Ok(count)
    }

    /// Clears the hardware binding of a redeemed license so the next use
    /// can rebind. Returns the previous binding, if any.
    pub fn reset_hardware(&self, key: &LicenseKey) -> LifecycleResult<Option<HardwareId>> {
        let mut map = self.store.load();
        let record = map.get_mut(key).ok_or(LifecycleError::NotFound)?;
        if !record.redeemed {
            return Err(LifecycleError::NotRedeemed);
        }
        let previous = record.hardware_id.take();
        self.commit(map)?;
        info!(key = %key, "hardware binding cleared");
        Ok(previous)
    }

    /// Deletes every license.
    pub fn purge_all(&self) -> LifecycleResult<()> {
        self.commit(LicenseMap::new())?;
        info!("license store purged");
        Ok(())
    }

    /// Aggregate counts for status displays. Read-only.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let map = self.store.load();
        let mut stats = StoreStats {
            total: map.len(),
            ..StoreStats::default()
        };
        for record in map.values() {
            if record.redeemed {
                stats.redeemed += 1;
            }
            *stats.by_kind.entry(record.kind).or_default() += 1;
        }
        stats.available = stats.total - stats.redeemed;
        stats
    }

    /// Read-only snapshot of the full authoritative map.
    #[must_use]
    pub fn all(&self) -> LicenseMap {
        self.store.load()
    }

    /// Persists `map` and, if a mirror is configured, dispatches one
    /// background push of the recomputed owner subsets. The write is
    /// durable before the push is attempted; push failures never reach
    /// the caller.
    fn commit(&self, map: LicenseMap) -> LifecycleResult<()> {
        self.store.save(&map)?;
        if let Some(mirror) = &self.mirror {
            mirror.dispatch(partition_by_owner(&map));
        }
        Ok(())
    }
}

fn claim(record: &mut LicenseRecord, owner: &OwnerId, now: DateTime<Utc>) {
    record.redeemed = true;
    record.online = true;
    record.owner_id = Some(owner.clone());
    record.redeemed_at = Some(now);
    record.expires = Some(Expiry::from_kind(record.kind, now));
}

fn receipt_for(record: &LicenseRecord, key: &LicenseKey, owner: &OwnerId) -> RedeemReceipt {
    RedeemReceipt {
        key: key.clone(),
        kind: record.kind,
        owner_id: owner.clone(),
        expires: record.expires.clone().unwrap_or(Expiry::Never),
        redeemed_at: record.redeemed_at,
    }
}
