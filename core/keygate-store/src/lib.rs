//! Flat-file persistence for the authoritative license map.
//!
//! The store is a single JSON document holding the whole key → record
//! mapping. `load` never fails: a missing, empty, or corrupt file degrades
//! to an empty map (logged), keeping callers available even when the
//! backing file is damaged. `save` replaces the whole file and surfaces
//! write errors to the caller.
//!
//! Callers are expected to read-modify-write the entire map under their
//! own serialization discipline; the store provides no locking.

mod error;

pub use error::{StoreError, StoreResult};

use keygate_types::LicenseMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Whole-file JSON store for the license map.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file path. The file is created
    /// on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full license map.
    ///
    /// A missing or empty file yields an empty map. Unreadable or corrupt
    /// contents are logged and also yield an empty map rather than
    /// propagating an error.
    #[must_use]
    pub fn load(&self) -> LicenseMap {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return LicenseMap::new(),
            Err(err) => {
                warn!("failed to read {}: {}", self.path.display(), err);
                return LicenseMap::new();
            }
        };
        if raw.trim().is_empty() {
            return LicenseMap::new();
        }
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!("invalid JSON in {}: {}", self.path.display(), err);
                LicenseMap::new()
            }
        }
    }

    /// Replaces the entire backing file with `map`.
    ///
    /// Parent directories are created on demand. Write errors are returned
    /// to the caller; they fail the single operation that triggered them.
    pub fn save(&self, map: &LicenseMap) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
