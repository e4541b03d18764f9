//! Fetch execution for picfetch.
//!
//! This crate turns logical resource requests into cancellable units of work
//! and runs them on a bounded worker pool:
//! - [`FetchOperation`]: one cache-then-network retrieval with cooperative
//!   cancellation check points
//! - [`FetchScheduler`]: accepts tasks, limits concurrency, and delivers each
//!   terminal result exactly once on a single consumer channel
//! - [`CancelToken`]: the explicit cancellation flag threaded through an
//!   operation and checked at every suspension boundary
//!
//! All completions cross from worker context to consumer context through one
//! mpsc channel, so a UI-like consumer can mutate its state without locking.

pub mod cancel;
pub mod client;
pub mod operation;
pub mod scheduler;

pub use cancel::CancelToken;
pub use client::HttpClient;
pub use operation::FetchOperation;
pub use scheduler::{CompletionReceiver, FetchHandle, FetchScheduler, SchedulerConfig};
