use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::{hash_bytes, hash_file, CacheEntry, CacheManifest};
use crate::errors::BuildError;
use crate::includes;
use crate::layout::CompilationUnit;

/// Digests of a unit and its direct local includes, freshly read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDigests {
    pub src_hash: String,
    pub dep_hashes: BTreeMap<PathBuf, String>,
    /// Resolved includes in order of appearance
    pub includes: Vec<PathBuf>,
}

impl UnitDigests {
    /// Hash the source and every existing quoted include it names.
    ///
    /// Only the includes written in the source itself are followed; headers
    /// pulled in by those headers are not.
    pub fn compute(source: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read(source).map_err(BuildError::source_read(source))?;
        let src_hash = hash_bytes(&content);
        let includes = includes::resolve_local_includes(source, &String::from_utf8_lossy(&content));

        let mut dep_hashes = BTreeMap::new();
        for dep in &includes {
            let digest = hash_file(dep).map_err(BuildError::source_read(dep))?;
            dep_hashes.insert(dep.clone(), digest);
        }

        Ok(Self {
            src_hash,
            dep_hashes,
            includes,
        })
    }

    /// The cache record to store once this unit compiled successfully
    pub fn to_entry(&self) -> CacheEntry {
        CacheEntry::new(self.src_hash.clone(), self.dep_hashes.clone())
    }
}

/// Why a unit must be recompiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    NotCached,
    SourceChanged,
    DependenciesChanged,
    ObjectMissing,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StaleReason::NotCached => "not in build cache",
            StaleReason::SourceChanged => "source changed",
            StaleReason::DependenciesChanged => "included headers changed",
            StaleReason::ObjectMissing => "object file missing",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale(_))
    }
}

/// Decides which units need recompilation against a loaded cache
pub struct StalenessOracle<'a> {
    manifest: &'a CacheManifest,
}

impl<'a> StalenessOracle<'a> {
    pub fn new(manifest: &'a CacheManifest) -> Self {
        Self { manifest }
    }

    /// Evaluate one unit against its cache entry.
    ///
    /// Checks run in a fixed order and stop at the first hit: no entry,
    /// source digest, the whole dependency digest map, then the object file.
    pub fn evaluate(&self, unit: &CompilationUnit, digests: &UnitDigests) -> Staleness {
        let entry = match self.manifest.get_entry(&unit.source) {
            Some(entry) => entry,
            None => return Staleness::Stale(StaleReason::NotCached),
        };

        if entry.src_hash != digests.src_hash {
            return Staleness::Stale(StaleReason::SourceChanged);
        }

        // Added, removed and modified headers all make the maps differ
        if entry.dep_hashes != digests.dep_hashes {
            return Staleness::Stale(StaleReason::DependenciesChanged);
        }

        if !unit.object.is_file() {
            return Staleness::Stale(StaleReason::ObjectMissing);
        }

        Staleness::Fresh
    }

    /// Recompute digests from disk and evaluate
    pub fn is_stale(&self, unit: &CompilationUnit) -> Result<bool, BuildError> {
        let digests = UnitDigests::compute(&unit.source)?;
        Ok(self.evaluate(unit, &digests).is_stale())
    }
}
