//! Shared fetch-task vocabulary.
//!
//! A fetch task is one logical request for a resource's bytes, independent of
//! whether it resolves from the cache or the network. Tasks move along exactly
//! one path, `Pending -> Running -> {Completed | Failed | Cancelled}`, and are
//! discarded once their result has been delivered; they are never re-queued.

use crate::errors::Result;
use bytes::Bytes;
use url::Url;
use uuid::Uuid;

/// Opaque identifier for one fetch task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a fetch task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, waiting for a worker slot
    Pending,
    /// A worker is executing the operation
    Running,
    /// Terminal: bytes delivered
    Completed,
    /// Terminal: network failure reported to the caller
    Failed,
    /// Terminal: cancelled before completion; no result delivered
    Cancelled,
}

impl TaskState {
    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Payload of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    /// Raw payload, passed through unmodified so decode failures downstream
    /// are reproducible
    pub bytes: Bytes,
    /// True when the bytes were served from the on-disk cache without a
    /// network round trip
    pub from_cache: bool,
}

impl FetchedBytes {
    pub fn from_store(bytes: Bytes) -> Self {
        Self {
            bytes,
            from_cache: true,
        }
    }

    pub fn from_network(bytes: Bytes) -> Self {
        Self {
            bytes,
            from_cache: false,
        }
    }
}

/// Terminal result of one fetch task, delivered exactly once on the
/// scheduler's single consumer channel
#[derive(Debug)]
pub struct Completion {
    pub id: TaskId,
    pub url: Url,
    pub outcome: Result<FetchedBytes>,
}

impl Completion {
    /// Terminal state this completion represents
    pub fn state(&self) -> TaskState {
        match &self.outcome {
            Ok(_) => TaskState::Completed,
            Err(e) if e.is_cancelled() => TaskState::Cancelled,
            Err(_) => TaskState::Failed,
        }
    }
}
