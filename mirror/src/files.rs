//! Per-owner mirror files and the merged aggregate.
//!
//! Each owner's subset lives in its own `owner_<id>.json`, written
//! whole-file on every upload. The aggregate is rebuilt by unioning all
//! owner files in sorted filename order; later files win on key
//! collision. Collisions are not expected — keys are globally unique —
//! but last-merged-wins is the aggregation rule.

use keygate_store::{JsonFileStore, StoreResult};
use keygate_types::{LicenseMap, OwnerId};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filename prefix for per-owner mirror files.
const OWNER_FILE_PREFIX: &str = "owner_";

/// Filename of the merged aggregate.
const AGGREGATE_FILE: &str = "aggregate.json";

/// Directory of per-owner mirror files plus the merged aggregate.
#[derive(Debug, Clone)]
pub struct MirrorDir {
    root: PathBuf,
}

impl MirrorDir {
    /// Creates a mirror directory rooted at `root`. The directory is
    /// created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_store(&self, owner: &OwnerId) -> JsonFileStore {
        JsonFileStore::new(self.root.join(format!("{OWNER_FILE_PREFIX}{owner}.json")))
    }

    fn aggregate_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.root.join(AGGREGATE_FILE))
    }

    /// Loads one owner's mirrored subset; empty if the owner has none.
    #[must_use]
    pub fn load_owner(&self, owner: &OwnerId) -> LicenseMap {
        self.owner_store(owner).load()
    }

    /// Replaces one owner's mirrored subset.
    pub fn save_owner(&self, owner: &OwnerId, subset: &LicenseMap) -> StoreResult<()> {
        self.owner_store(owner).save(subset)
    }

    /// Loads the merged aggregate as last rebuilt.
    #[must_use]
    pub fn load_aggregate(&self) -> LicenseMap {
        self.aggregate_store().load()
    }

    /// Rebuilds the aggregate from all owner files and returns the total
    /// license count.
    pub fn rebuild_aggregate(&self) -> StoreResult<usize> {
        let mut aggregate = LicenseMap::new();
        for path in self.owner_files()? {
            aggregate.extend(JsonFileStore::new(path).load());
        }
        self.aggregate_store().save(&aggregate)?;
        Ok(aggregate.len())
    }

    fn owner_files(&self) -> StoreResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(OWNER_FILE_PREFIX) && name.ends_with(".json") {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}
