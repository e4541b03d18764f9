//! Error types for the fetch-and-cache subsystem.
//!
//! Only two failure classes are ever surfaced to the component that requested
//! a fetch: [`Error::Network`] and [`Error::Cancelled`]. Cache-layer failures
//! (`CacheWrite`, `CacheSweep`) degrade gracefully, a failed cache read is
//! treated as a miss and a failed cache write merely skips caching, so callers
//! never see them unless they ask for the store directly.

use std::path::PathBuf;

/// Result type alias for picfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for picfetch operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure or non-2xx response from the remote host
    #[error("network request to '{url}' failed{}", format_status(.status))]
    Network {
        url: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed URL handed to the scheduler; aborts before anything is queued
    #[error("invalid resource URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Writing a cache entry failed; callers log this and keep the fetched bytes
    #[error("failed to write cache entry '{path}': {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The eviction sweep hit an I/O failure and aborted; the next put retries
    #[error("cache sweep aborted at '{path}': {source}")]
    CacheSweep {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// General file system failure outside the write/sweep paths
    #[error("file system {operation} failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The fetch was cancelled before it reached a terminal state
    #[error("fetch cancelled")]
    Cancelled,
}

impl Error {
    /// Transport-level network failure (DNS, connect, timeout, body read)
    pub fn network_transport(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            url: url.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Non-2xx HTTP response
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::Network {
            url: url.into(),
            status: Some(status),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error represents cooperative cancellation rather than a
    /// real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {code}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_display_includes_status() {
        let err = Error::http_status("http://example.com/users", 503);
        assert_eq!(
            err.to_string(),
            "network request to 'http://example.com/users' failed with status 503"
        );
    }

    #[test]
    fn transport_error_display_omits_status() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::network_transport("http://example.com", io);
        assert_eq!(
            err.to_string(),
            "network request to 'http://example.com' failed"
        );
    }

    #[test]
    fn cancelled_is_detectable() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::configuration("bad").is_cancelled());
    }
}
