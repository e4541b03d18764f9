//! Time-bucketed cache key derivation.
//!
//! A key is the request URL stripped of filename-unsafe characters, followed
//! by a fixed-width token naming the freshness bucket (by default the clock
//! hour) the request was issued in. Two requests for the same URL inside one
//! bucket map to the same entry; a request in the next bucket maps to a fresh
//! entry and the stale one is left behind to age out via the eviction sweep.
//! Nothing proactively deletes stale entries.

use chrono::{DateTime, Utc};
use picfetch_core::{Error, Result, FRESHNESS_BUCKET};
use std::time::Duration;

const HOUR_SECS: u64 = 3600;

/// Derives [`ByteStore`](crate::ByteStore) keys from resource URLs.
///
/// The key doubles as the cache filename, so the URL portion is reduced to a
/// conservative allow list of filename-safe characters. Path separators in
/// particular must never survive into a key. The bucket token has hour
/// resolution, so the bucket width is constrained to whole multiples of an
/// hour; [`FRESHNESS_BUCKET`] is the default.
#[derive(Debug, Clone, Copy)]
pub struct CacheKeyGenerator {
    bucket_secs: i64,
}

impl Default for CacheKeyGenerator {
    fn default() -> Self {
        Self {
            bucket_secs: FRESHNESS_BUCKET.as_secs() as i64,
        }
    }
}

impl CacheKeyGenerator {
    /// Generator with the default one-hour freshness bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator with a custom bucket width. The width must be a non-zero
    /// multiple of one hour, the resolution of the key's timestamp token.
    pub fn with_bucket(bucket: Duration) -> Result<Self> {
        let secs = bucket.as_secs();
        if secs == 0 || secs % HOUR_SECS != 0 {
            return Err(Error::configuration(format!(
                "freshness bucket must be a non-zero multiple of one hour, got {secs}s"
            )));
        }
        Ok(Self {
            bucket_secs: secs as i64,
        })
    }

    /// Width of the freshness bucket this generator derives keys for.
    pub fn bucket(&self) -> Duration {
        Duration::from_secs(self.bucket_secs as u64)
    }

    /// Compute the cache key for `url` as issued at `now`.
    ///
    /// Byte-identical for identical URLs within one bucket; differs across a
    /// bucket boundary.
    pub fn key_for(&self, url: &str, now: DateTime<Utc>) -> String {
        let mut key = sanitize(url);
        key.push_str(&self.bucket_token(now));
        key
    }

    /// Fixed-width month/day/year/hour token for the bucket containing `now`.
    fn bucket_token(&self, now: DateTime<Utc>) -> String {
        let ts = now.timestamp();
        let start = ts - ts.rem_euclid(self.bucket_secs);
        // `start` is at most `now` and epoch-aligned, always representable.
        let bucket_start = DateTime::<Utc>::from_timestamp(start, 0).unwrap_or(now);
        bucket_start.format("%m%d%Y%H").to_string()
    }
}

/// Strip everything that is not safe in a filename component.
fn sanitize(url: &str) -> String {
    url.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}
