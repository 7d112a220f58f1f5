use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{CacheError, CacheManifest, Result, CACHE_VERSION};

/// Loads and persists the build cache file
pub struct CacheManager {
    /// Path to the cache file
    cache_path: PathBuf,
}

impl CacheManager {
    /// Create a manager for the cache file at `cache_path`
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Load the cache, falling back to an empty one.
    ///
    /// A missing file is the normal first-build case. An unreadable, corrupt
    /// or version-mismatched file is logged and discarded; the build then
    /// recompiles everything.
    pub fn load(&self) -> CacheManifest {
        match self.try_load() {
            Ok(Some(manifest)) => {
                info!("Loaded build cache with {} units", manifest.len());
                manifest
            }
            Ok(None) => {
                info!("No build cache found, starting fresh");
                CacheManifest::new()
            }
            Err(e) => {
                warn!(
                    "Discarding unusable build cache {}: {}",
                    self.cache_path.display(),
                    e
                );
                CacheManifest::new()
            }
        }
    }

    /// Load the cache, reporting why it cannot be used
    pub fn try_load(&self) -> Result<Option<CacheManifest>> {
        if !self.cache_path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(&self.cache_path).map_err(|source| CacheError::Io {
            path: self.cache_path.clone(),
            source,
        })?;
        let manifest = CacheManifest::from_bytes(&bytes)?;

        if !manifest.is_version_compatible() {
            return Err(CacheError::VersionMismatch {
                expected: CACHE_VERSION,
                found: manifest.version,
            });
        }

        Ok(Some(manifest))
    }

    /// Persist the full manifest, replacing any previous cache file.
    ///
    /// Writes a sibling temp file first and renames it into place so a crash
    /// mid-write never leaves a truncated cache behind.
    pub fn save(&self, manifest: &CacheManifest) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let bytes = manifest.to_bytes()?;
        let tmp_path = self.cache_path.with_extension("bin.tmp");
        std::fs::write(&tmp_path, &bytes).map_err(|source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.cache_path).map_err(|source| CacheError::Io {
            path: self.cache_path.clone(),
            source,
        })?;

        info!("Saved build cache with {} units", manifest.len());
        Ok(())
    }

    /// Remove the cache file so the next build starts from scratch
    pub fn clear(&self) -> Result<()> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path).map_err(|source| CacheError::Io {
                path: self.cache_path.clone(),
                source,
            })?;
            info!("Build cache cleared");
        }
        Ok(())
    }
}
