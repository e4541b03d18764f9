//! Bounded on-disk byte cache for picfetch.
//!
//! This crate provides the storage half of the fetch-and-cache subsystem:
//! - [`ByteStore`]: a content-agnostic, size-bounded cache mapping an opaque
//!   string key to one file on disk
//! - [`CacheKeyGenerator`]: derives time-bucketed keys from resource URLs so
//!   cached API data is not served stale indefinitely
//! - an eviction sweep, triggered asynchronously on write, that trims the
//!   cache directory back under its size budget
//!
//! The store is deliberately dumb about its payloads: file bytes are the raw
//! fetched body (JSON text or image bytes), so decoding stays a consumer
//! concern and decode failures remain reproducible from the cached file.

pub mod config;
pub mod keys;
pub mod store;

mod sweep;

pub use config::CacheConfig;
pub use keys::CacheKeyGenerator;
pub use store::{ByteStore, StoreStatistics};
