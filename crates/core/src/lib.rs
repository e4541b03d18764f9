//! Core domain types, errors, and constants for `picfetch`.
//!
//! This crate establishes the foundational data structures and error handling
//! mechanisms used throughout the workspace. It aims to provide clear,
//! type-safe, and consistent building blocks.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   centralizing all possible failure modes for predictable error handling.
//! - **`types`**: Contains the fetch-task vocabulary shared by the cache and
//!   scheduler crates: task identifiers, task states, and completion records.
//! - **`constants`**: Shared tunables such as the cache size budget and the
//!   worker pool width.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::{Completion, FetchedBytes, TaskId, TaskState},
};
