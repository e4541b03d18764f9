//! Eviction sweep.
//!
//! Keeps the cache directory under its size budget. The policy mirrors the
//! store's historical contract exactly: when total size reaches the ceiling,
//! entries are deleted **newest first** until the total drops under the trim
//! floor. This is not LRU, and callers must not assume "most recently fetched
//! survives". Changing the tie-break would silently break consumers that have
//! calibrated around it, so it stays.

use crate::config::CacheConfig;
use crate::store::StoreInner;
use picfetch_core::Error;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use tokio::fs;

/// One cache file observed by the directory snapshot.
struct SweepEntry {
    path: PathBuf,
    size: u64,
    created: SystemTime,
}

/// Background entry point used by `ByteStore::put`. Failures are fatal to the
/// sweep only: logged, sweep abandoned, next put retries.
pub(crate) async fn run(inner: &StoreInner) {
    match sweep_once(&inner.config).await {
        Ok(0) => {}
        Ok(evicted) => {
            inner.stats.evictions.fetch_add(evicted, Ordering::Relaxed);
            tracing::debug!(evicted, "eviction sweep trimmed cache");
        }
        Err(e) => {
            tracing::warn!("eviction sweep aborted: {e}");
        }
    }
}

/// Run one sweep to completion, returning how many entries were deleted.
///
/// The directory listing and sizes are snapshotted up front; concurrent puts
/// landing after the snapshot are simply not considered until the next sweep.
/// Only visible regular files are eligible for deletion; directories,
/// symlinks, and hidden files (including in-progress staging writes) are
/// ignored.
pub(crate) async fn sweep_once(config: &CacheConfig) -> picfetch_core::Result<u64> {
    let mut entries = snapshot(config).await?;

    let mut total: u64 = entries.iter().map(|e| e.size).sum();
    if total < config.max_size_bytes {
        return Ok(0);
    }

    // Newest first; ties broken by path for determinism.
    entries.sort_by(|a, b| b.created.cmp(&a.created).then(b.path.cmp(&a.path)));

    let mut evicted = 0u64;
    for entry in entries {
        if total <= config.trim_size_bytes {
            break;
        }
        match fs::remove_file(&entry.path).await {
            Ok(()) => {
                total = total.saturating_sub(entry.size);
                evicted += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Already gone (overwritten or removed since the snapshot);
                // its bytes no longer count either way.
                total = total.saturating_sub(entry.size);
            }
            Err(e) => {
                return Err(Error::CacheSweep {
                    path: entry.path,
                    source: e,
                });
            }
        }
    }

    Ok(evicted)
}

/// Take a point-in-time listing of the regular files in the cache directory.
async fn snapshot(config: &CacheConfig) -> picfetch_core::Result<Vec<SweepEntry>> {
    let mut reader = match fs::read_dir(&config.root).await {
        Ok(reader) => reader,
        Err(e) => {
            return Err(Error::CacheSweep {
                path: config.root.clone(),
                source: e,
            });
        }
    };

    let mut entries = Vec::new();
    loop {
        let entry = match reader.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                return Err(Error::CacheSweep {
                    path: config.root.clone(),
                    source: e,
                });
            }
        };

        // Hidden files are not cache entries; in particular a put's staging
        // file must neither count toward the total nor be deleted mid-write.
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(Error::CacheSweep {
                    path: entry.path(),
                    source: e,
                });
            }
        };

        // Directories and symlinks are never deletion candidates.
        if !metadata.is_file() {
            continue;
        }

        // Not every filesystem reports a birth time; fall back to mtime,
        // which for whole-file-overwrite entries tracks it closely.
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        entries.push(SweepEntry {
            path: entry.path(),
            size: metadata.len(),
            created,
        });
    }

    Ok(entries)
}
