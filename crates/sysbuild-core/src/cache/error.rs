use std::path::PathBuf;
use thiserror::Error;

/// Problems reading or writing the build cache.
///
/// Load failures never abort a build: the manager logs them and starts from
/// an empty cache, which forces a full rebuild.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

pub type Result<T> = std::result::Result<T, CacheError>;
