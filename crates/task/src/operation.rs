//! A single cancellable fetch.

use crate::cancel::CancelToken;
use crate::client::HttpClient;
use picfetch_cache::ByteStore;
use picfetch_core::{Error, FetchedBytes, Result};
use url::Url;

/// One cache-then-network retrieval of a resource's bytes.
///
/// The operation consults the store first and only falls back to the network
/// on a miss; a successful network fetch is written back to the store on a
/// detached task so a slow or failing disk never delays or fails the fetch
/// itself. The cancellation token is checked before the cache read, before
/// the network call, and after the response resolves. Once cancelled the
/// operation will not write to the store and reports [`Error::Cancelled`]
/// instead of a result.
#[derive(Debug)]
pub struct FetchOperation {
    url: Url,
    cache_key: String,
    token: CancelToken,
}

impl FetchOperation {
    pub fn new(url: Url, cache_key: impl Into<String>, token: CancelToken) -> Self {
        Self {
            url,
            cache_key: cache_key.into(),
            token,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Run the fetch to a terminal state.
    pub async fn run(&self, store: &ByteStore, client: &HttpClient) -> Result<FetchedBytes> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // A failed cache read degrades to a miss; only the store's own
        // callers ever see cache-layer errors.
        match store.get(&self.cache_key).await {
            Ok(Some(bytes)) => return Ok(FetchedBytes::from_store(bytes)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %self.cache_key, "cache read failed, treating as miss: {e}");
            }
        }

        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let bytes = client.get_bytes(&self.url).await?;

        // Cancelled while the response was in flight: discard, and above all
        // do not cache.
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let store = store.clone();
        let key = self.cache_key.clone();
        let payload = bytes.clone();
        tokio::spawn(async move {
            if let Err(e) = store.put(&key, &payload).await {
                tracing::warn!(key = %key, "failed to cache fetched bytes: {e}");
            }
        });

        Ok(FetchedBytes::from_network(bytes))
    }
}
