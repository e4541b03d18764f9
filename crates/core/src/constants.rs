//! Shared constants for the fetch-and-cache subsystem.

use std::time::Duration;

/// Hard ceiling for the on-disk cache; crossing it triggers an eviction sweep.
pub const MAX_CACHE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Floor the eviction sweep trims down to. Strictly less than
/// [`MAX_CACHE_SIZE_BYTES`]; the gap absorbs write bursts so a sweep is not
/// re-triggered by every single put.
pub const TRIM_CACHE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Number of fetch operations allowed to run concurrently.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Width of the freshness bucket used when deriving cache keys. Requests for
/// the same URL within one bucket share a key; requests in different buckets
/// are treated as new fetches.
pub const FRESHNESS_BUCKET: Duration = Duration::from_secs(3600);

/// Upper bound on a single network fetch. The source behavior had no timeout;
/// this is a deliberate addition, unbounded network waits are a latent risk.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
