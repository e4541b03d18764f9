//! HTTP client for resource fetches.

use bytes::Bytes;
use picfetch_core::{Error, Result, DEFAULT_FETCH_TIMEOUT};
use std::time::Duration;
use url::Url;

/// Thin wrapper around [`reqwest::Client`] with the fetch timeout applied.
///
/// One GET per call, no retries: a transport error and a non-2xx response
/// both come back as [`Error::Network`], and whether to try again is the
/// caller's decision. The timeout is new behavior relative to the historical
/// contract, which waited forever.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                return Err(Error::configuration(format!(
                    "failed to build HTTP client: {e}"
                )));
            }
        };
        Ok(Self { inner })
    }

    /// Perform a single GET and return the raw body bytes.
    pub async fn get_bytes(&self, url: &Url) -> Result<Bytes> {
        let response = match self.inner.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return Err(Error::network_transport(url.as_str(), e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(url.as_str(), status.as_u16()));
        }
        tracing::debug!(url = %url, status = status.as_u16(), "fetched remote resource");

        match response.bytes().await {
            Ok(bytes) => Ok(bytes),
            Err(e) => Err(Error::network_transport(url.as_str(), e)),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        match Self::new(DEFAULT_FETCH_TIMEOUT) {
            Ok(client) => client,
            // Builder failure here means a broken TLS backend; fall back to
            // the stock client rather than panic, it only loses the timeout.
            Err(_) => Self {
                inner: reqwest::Client::new(),
            },
        }
    }
}
