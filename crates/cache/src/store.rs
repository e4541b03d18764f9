//! Size-bounded on-disk byte store.

use crate::config::CacheConfig;
use crate::sweep;
use bytes::Bytes;
use picfetch_core::{Error, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;

/// Content-agnostic cache mapping an opaque string key to one file on disk.
///
/// Cloning is cheap; all clones share the same directory, budget, and
/// statistics. Writes are whole-file overwrites keyed per request, so there
/// are no read-modify-write races between workers, and the eviction sweep
/// takes a directory snapshot before deciding what to delete.
#[derive(Clone)]
pub struct ByteStore {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    pub(crate) config: CacheConfig,
    pub(crate) stats: StoreStats,
    /// Collapses bursts of puts into one in-flight sweep
    pub(crate) sweep_running: AtomicBool,
}

#[derive(Default)]
pub(crate) struct StoreStats {
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) writes: AtomicU64,
    pub(crate) evictions: AtomicU64,
}

/// Point-in-time snapshot of store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatistics {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
}

impl ByteStore {
    /// Open a store rooted at `config.root`, creating the directory if needed.
    pub async fn new(config: CacheConfig) -> Result<Self> {
        match fs::create_dir_all(&config.root).await {
            Ok(()) => {}
            Err(e) => {
                return Err(Error::Io {
                    path: config.root.clone(),
                    operation: "create cache directory",
                    source: e,
                });
            }
        }

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                stats: StoreStats::default(),
                sweep_running: AtomicBool::new(false),
            }),
        })
    }

    /// Read the entry for `key`. Absent is not an error; a pure filesystem
    /// read, never touches the network.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                self.inner.stats.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, "cache hit");
                Ok(Some(Bytes::from(bytes)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.inner.stats.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, "cache miss");
                Ok(None)
            }
            Err(e) => Err(Error::Io {
                path,
                operation: "read cache entry",
                source: e,
            }),
        }
    }

    /// Write `bytes` under `key`, overwriting any prior entry, then trigger
    /// the eviction sweep on a background task.
    ///
    /// The write is visible to an immediate `get` before this returns; the
    /// sweep never blocks the caller and its failures never surface here. A
    /// failed write leaves any prior entry for the key untouched.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        let staging = self.staging_path(key);

        // Stage then rename so a prior entry survives a partial write and
        // readers never observe a half-written file.
        match fs::write(&staging, bytes).await {
            Ok(()) => {}
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(Error::CacheWrite { path, source: e });
            }
        }
        match fs::rename(&staging, &path).await {
            Ok(()) => {}
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(Error::CacheWrite { path, source: e });
            }
        }

        self.inner.stats.writes.fetch_add(1, Ordering::Relaxed);

        // Fire-and-forget; at most one sweep runs at a time and the next put
        // re-triggers if this one aborts.
        if self
            .inner
            .sweep_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                sweep::run(&inner).await;
                inner.sweep_running.store(false, Ordering::Release);
            });
        }

        Ok(())
    }

    /// Run the eviction sweep inline. `put` triggers this automatically in
    /// the background; exposed for callers that need a deterministic bound,
    /// deletions are counted in [`StoreStatistics::evictions`].
    pub async fn evict_if_needed(&self) -> Result<()> {
        let evicted = sweep::sweep_once(&self.inner.config).await?;
        self.inner
            .stats
            .evictions
            .fetch_add(evicted, Ordering::Relaxed);
        Ok(())
    }

    pub fn statistics(&self) -> StoreStatistics {
        StoreStatistics {
            hits: self.inner.stats.hits.load(Ordering::Relaxed),
            misses: self.inner.stats.misses.load(Ordering::Relaxed),
            writes: self.inner.stats.writes.load(Ordering::Relaxed),
            evictions: self.inner.stats.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.inner.config.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.inner.config.root.join(key)
    }

    // Dot-prefixed so the sweep never counts or deletes a write in progress;
    // hidden files are invisible to the snapshot.
    fn staging_path(&self, key: &str) -> PathBuf {
        self.inner.config.root.join(format!(".{key}.staging"))
    }
}

impl std::fmt::Debug for ByteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStore")
            .field("root", &self.inner.config.root)
            .field("max_size_bytes", &self.inner.config.max_size_bytes)
            .field("trim_size_bytes", &self.inner.config.trim_size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store_in(dir: &TempDir) -> ByteStore {
        ByteStore::new(CacheConfig::new(dir.path()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        store.put("photos1", b"payload bytes").await.unwrap();
        let got = store.get("photos1").await.unwrap();
        assert_eq!(got.as_deref(), Some(b"payload bytes".as_slice()));
    }

    #[tokio::test]
    async fn get_of_absent_key_is_none_not_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        assert!(store.get("nothing-here").await.unwrap().is_none());
        assert_eq!(store.statistics().misses, 1);
    }

    #[tokio::test]
    async fn put_overwrites_prior_entry() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        store.put("users", b"old").await.unwrap();
        store.put("users", b"new and longer").await.unwrap();
        let got = store.get("users").await.unwrap();
        assert_eq!(got.as_deref(), Some(b"new and longer".as_slice()));
    }

    #[tokio::test]
    async fn put_is_visible_to_immediate_get() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        for i in 0..20u32 {
            let key = format!("entry{i}");
            store.put(&key, &i.to_be_bytes()).await.unwrap();
            assert!(store.get(&key).await.unwrap().is_some());
        }
        assert_eq!(store.statistics().writes, 20);
    }

    #[tokio::test]
    async fn evict_if_needed_enforces_the_budget_inline() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::new(dir.path()).with_budget(1000, 500).unwrap();
        let store = ByteStore::new(config).await.unwrap();

        for i in 0..10u32 {
            let path = dir.path().join(format!("entry{i}"));
            tokio::fs::write(&path, vec![b'x'; 100]).await.unwrap();
        }

        store.evict_if_needed().await.unwrap();
        let total: u64 = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().metadata().unwrap().len())
            .sum();
        assert!(total <= 500);
        assert_eq!(store.statistics().evictions, 5);
    }

    #[tokio::test]
    async fn binary_payloads_survive_unmodified() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        store.put("blob", &payload).await.unwrap();
        assert_eq!(store.get("blob").await.unwrap().unwrap(), payload);
    }
}
