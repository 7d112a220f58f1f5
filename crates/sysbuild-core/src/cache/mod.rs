//! Persistent build cache for incremental compilation
//!
//! Records, per compilation unit, the digest of the source and of every local
//! header it includes as observed at the last successful compile. The next
//! build compares fresh digests against these records to decide which units
//! can reuse their object files.

mod error;
mod hash;
mod manager;
mod manifest;
mod staleness;

pub use error::{CacheError, Result};
pub use hash::{hash_bytes, hash_file};
pub use manager::CacheManager;
pub use manifest::{CacheEntry, CacheManifest};
pub use staleness::{StaleReason, Staleness, StalenessOracle, UnitDigests};

/// Cache format version - increment when cache structure changes
pub const CACHE_VERSION: u32 = 1;

/// Cache file name, placed directly under the build output directory
pub const CACHE_FILE_NAME: &str = ".sysbuild-cache.bin";
