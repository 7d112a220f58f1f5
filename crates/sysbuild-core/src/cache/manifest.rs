use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{CacheError, Result, CACHE_VERSION};

/// Serialized mapping of every compilation unit seen by a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Schema version for cache format
    pub version: u32,

    /// Source path -> digests recorded at its last successful compile
    pub entries: FxHashMap<PathBuf, CacheEntry>,
}

/// Digests of one unit observed at its last successful compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Blake3 hash of the source file
    pub src_hash: String,

    /// Resolved local include -> Blake3 hash of that header
    pub dep_hashes: BTreeMap<PathBuf, String>,
}

impl CacheManifest {
    /// Create a new empty manifest at the current format version
    pub fn new() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: FxHashMap::default(),
        }
    }

    /// Check if manifest version matches current cache version
    pub fn is_version_compatible(&self) -> bool {
        self.version == CACHE_VERSION
    }

    /// Serialize manifest to binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(CacheError::from)
    }

    /// Deserialize manifest from binary format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(CacheError::from)
    }

    /// Add or overwrite the entry for a unit
    pub fn insert_entry(&mut self, source: PathBuf, entry: CacheEntry) {
        self.entries.insert(source, entry);
    }

    pub fn get_entry(&self, source: &Path) -> Option<&CacheEntry> {
        self.entries.get(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of recorded header dependencies across all units
    pub fn dependency_count(&self) -> usize {
        self.entries.values().map(|e| e.dep_hashes.len()).sum()
    }
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheEntry {
    pub fn new(src_hash: String, dep_hashes: BTreeMap<PathBuf, String>) -> Self {
        Self {
            src_hash,
            dep_hashes,
        }
    }
}
