//! Bounded fetch scheduler.

use crate::cancel::CancelToken;
use crate::client::HttpClient;
use crate::operation::FetchOperation;
use chrono::Utc;
use picfetch_cache::{ByteStore, CacheKeyGenerator};
use picfetch_core::{
    Completion, Error, Result, TaskId, DEFAULT_FETCH_TIMEOUT, DEFAULT_WORKER_POOL_SIZE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use url::Url;

/// Receiving end of the scheduler's single consumer channel.
///
/// Every task's terminal result arrives here exactly once, in whatever order
/// the operations finish. Draining this receiver from one place is what lets
/// UI-like consumers mutate their state without locking.
pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

/// Tuning knobs for one scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of fetch operations allowed to run concurrently
    pub pool_size: usize,
    /// Per-request network timeout
    pub fetch_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_WORKER_POOL_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Cancellation handle returned from [`FetchScheduler::fetch`].
///
/// Dropping the handle does nothing; the task runs to completion and its
/// result is still delivered.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    id: TaskId,
    token: CancelToken,
}

impl FetchHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Request cancellation of this task.
    ///
    /// A task that has not started yet will never touch the network; a task
    /// already past its last cancellation check point completes internally
    /// but its result is discarded and a `Cancelled` completion is delivered
    /// instead.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct SchedulerInner {
    store: ByteStore,
    client: HttpClient,
    keys: CacheKeyGenerator,
    permits: Semaphore,
    completions: mpsc::UnboundedSender<Completion>,
}

/// Runs [`FetchOperation`]s on a bounded worker pool.
///
/// Guarantees per task: at-most-one execution, exactly-one completion
/// delivery on the consumer channel, cooperative cancellation. No ordering is
/// guaranteed across independent tasks, and concurrent tasks for the same
/// cache key race independently against the store and the network; the first
/// writer wins the cache slot and later writers overwrite it with identical
/// bytes.
#[derive(Clone)]
pub struct FetchScheduler {
    inner: Arc<SchedulerInner>,
}

impl FetchScheduler {
    /// Create a scheduler over `store`, returning it together with the
    /// consumer-side completion receiver.
    pub fn new(store: ByteStore, config: SchedulerConfig) -> Result<(Self, CompletionReceiver)> {
        if config.pool_size == 0 {
            return Err(Error::configuration("worker pool size must be non-zero"));
        }
        let client = HttpClient::new(config.fetch_timeout)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            inner: Arc::new(SchedulerInner {
                store,
                client,
                keys: CacheKeyGenerator::new(),
                permits: Semaphore::new(config.pool_size),
                completions: tx,
            }),
        };
        Ok((scheduler, rx))
    }

    /// Enqueue a fetch for `url` and return its cancellation handle.
    ///
    /// A malformed URL is a programming error upstream and fails here, before
    /// anything is scheduled. Every accepted task produces exactly one
    /// [`Completion`] on the receiver, including cancelled ones.
    pub fn fetch(&self, url: &str) -> Result<FetchHandle> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(Error::InvalidUrl {
                    url: url.to_string(),
                    source: e,
                });
            }
        };

        let id = TaskId::new();
        let token = CancelToken::new();
        let cache_key = self.inner.keys.key_for(parsed.as_str(), Utc::now());

        let inner = Arc::clone(&self.inner);
        let task_token = token.clone();
        let task_url = parsed.clone();
        tokio::spawn(async move {
            let outcome = Self::execute(&inner, &task_url, cache_key, &task_token).await;
            tracing::debug!(%id, url = %task_url, "fetch task reached terminal state");
            // The consumer hanging up just means nobody wants results anymore.
            let _ = inner.completions.send(Completion {
                id,
                url: task_url,
                outcome,
            });
        });

        Ok(FetchHandle { id, token })
    }

    /// Cancel a task by its handle. Equivalent to [`FetchHandle::cancel`].
    pub fn cancel(&self, handle: &FetchHandle) {
        handle.cancel();
    }

    /// Statistics of the underlying store.
    pub fn store_statistics(&self) -> picfetch_cache::StoreStatistics {
        self.inner.store.statistics()
    }

    async fn execute(
        inner: &SchedulerInner,
        url: &Url,
        cache_key: String,
        token: &CancelToken,
    ) -> Result<picfetch_core::FetchedBytes> {
        // Cancelled while still pending: report without consuming a worker
        // slot or touching the network.
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let _permit = match inner.permits.acquire().await {
            Ok(permit) => permit,
            // The semaphore outlives every task; closure is unreachable, but
            // a completion must still be delivered.
            Err(_) => return Err(Error::Cancelled),
        };

        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let operation = FetchOperation::new(url.clone(), cache_key, token.clone());
        let outcome = operation.run(&inner.store, &inner.client).await;

        // Cancellation racing completion: the late result is discarded, the
        // caller sees Cancelled.
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        outcome
    }
}

impl std::fmt::Debug for FetchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchScheduler")
            .field("available_permits", &self.inner.permits.available_permits())
            .finish()
    }
}
