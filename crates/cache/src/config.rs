//! Cache configuration.

use picfetch_core::{Error, Result, MAX_CACHE_SIZE_BYTES, TRIM_CACHE_SIZE_BYTES};
use std::path::PathBuf;

/// Size budget and location of one [`ByteStore`](crate::ByteStore) instance.
///
/// The root directory is injectable so every test (and every embedding
/// application) can run against its own isolated cache directory instead of a
/// process-wide location.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding one file per cache key
    pub root: PathBuf,
    /// Hard ceiling; any write that leaves the directory at or above this
    /// size triggers an eviction sweep
    pub max_size_bytes: u64,
    /// Floor the sweep trims down to; strictly less than `max_size_bytes`
    pub trim_size_bytes: u64,
}

impl CacheConfig {
    /// Configuration with the default 10 MiB / 5 MiB budget rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_size_bytes: MAX_CACHE_SIZE_BYTES,
            trim_size_bytes: TRIM_CACHE_SIZE_BYTES,
        }
    }

    /// Override the size budget. Fails when the trim floor does not leave
    /// headroom below the ceiling, the gap is what absorbs write bursts.
    pub fn with_budget(mut self, max_size_bytes: u64, trim_size_bytes: u64) -> Result<Self> {
        if trim_size_bytes >= max_size_bytes {
            return Err(Error::configuration(format!(
                "trim size ({trim_size_bytes}) must be below max size ({max_size_bytes})"
            )));
        }
        if max_size_bytes == 0 {
            return Err(Error::configuration("max cache size must be non-zero"));
        }
        self.max_size_bytes = max_size_bytes;
        self.trim_size_bytes = trim_size_bytes;
        Ok(self)
    }
}
