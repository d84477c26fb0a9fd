//! Caching decorator for response builders

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::ResponseBuilder;
use crate::cache::CacheStore;
use crate::error::Error;
use crate::fetch::Fetcher;
use crate::response::Response;

/// Header telling clients whether the response came from the cache
pub const CACHE_HEADER: &str = "X-Cache";

/// Wraps a builder and caches its share responses by URL
///
/// Only `share_response` goes through the cache. Error responses are built by
/// the wrapped builder and never stored.
#[derive(Debug)]
pub struct CachedResponseBuilder<B> {
    inner: B,
    store: Arc<dyn CacheStore>,
}

impl<B: ResponseBuilder> CachedResponseBuilder<B> {
    pub fn new(inner: B, store: Arc<dyn CacheStore>) -> Self {
        Self { inner, store }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Reads the entry for `url` on the blocking pool; any failure is a miss
    async fn cached(&self, url: &str) -> Option<Response> {
        let store = Arc::clone(&self.store);
        let key = url.to_string();
        let value = match tokio::task::spawn_blocking(move || store.get(&key)).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(url = %url, error = %e, "Cache lookup did not complete");
                return None;
            }
        };

        match Response::from_cache_value(&value) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(url = %url, error = %e, "Discarding undecodable cached response");
                None
            }
        }
    }

    /// Stores a response; failures only cost the next request a refetch
    async fn store_response(&self, url: &str, response: &Response) {
        let value = match response.to_cache_value() {
            Ok(value) => value,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to serialize response for caching");
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let key = url.to_string();
        match tokio::task::spawn_blocking(move || store.set_default(&key, &value)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(url = %url, error = %e, "Failed to cache response"),
            Err(e) => warn!(url = %url, error = %e, "Cache write did not complete"),
        }
    }
}

#[async_trait]
impl<B: ResponseBuilder> ResponseBuilder for CachedResponseBuilder<B> {
    fn register_fetcher(&mut self, name: &str, fetcher: Arc<dyn Fetcher>) {
        self.inner.register_fetcher(name, fetcher);
    }

    async fn share_response(&self, url: &str) -> Result<Response, Error> {
        if let Some(mut response) = self.cached(url).await {
            debug!(url = %url, "Cache hit");
            response.set_header(CACHE_HEADER, "HIT");
            return Ok(response);
        }

        debug!(url = %url, "Cache miss");
        let mut response = self.inner.share_response(url).await?;

        // Persist before marking, so hits never replay a MISS marker.
        if response.partial {
            debug!(url = %url, "Partial response, not caching");
        } else {
            self.store_response(url, &response).await;
        }
        response.set_header(CACHE_HEADER, "MISS");
        Ok(response)
    }

    fn error_response(&self, message: &str) -> Response {
        self.inner.error_response(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::stub::StubFetcher;
    use crate::builder::{FailurePolicy, ShareResponseBuilder};
    use crate::cache::{FileStore, ManualClock, NullStore, DEFAULT_TTL};
    use crate::error::CacheError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// In-memory store recording every call
    #[derive(Debug, Default)]
    struct SpyStore {
        entries: Mutex<Vec<(String, String)>>,
        gets: AtomicUsize,
        sets: AtomicUsize,
        fail_sets: bool,
    }

    impl CacheStore for SpyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.entries
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }

        fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            if self.fail_sets {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            self.entries
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    fn plain_builder(fetcher: Arc<StubFetcher>) -> ShareResponseBuilder {
        let mut builder = ShareResponseBuilder::new();
        builder.register_fetcher("facebook", fetcher);
        builder
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let fetcher = StubFetcher::count(42);
        let store = Arc::new(SpyStore::default());
        let builder = CachedResponseBuilder::new(plain_builder(fetcher.clone()), store.clone());

        let first = builder.share_response("https://example.com/").await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(first.header(CACHE_HEADER), Some("MISS"));

        let second = builder.share_response("https://example.com/").await.unwrap();
        assert_eq!(fetcher.calls(), 1, "Cache hit must not invoke any fetcher");
        assert_eq!(second.header(CACHE_HEADER), Some("HIT"));

        assert_eq!(first.body, second.body);
        assert_eq!(first.body, r#"{"error":false,"share":{"facebook":42}}"#);
        assert_eq!(store.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stored_copy_has_no_miss_marker() {
        let store = Arc::new(SpyStore::default());
        let builder = CachedResponseBuilder::new(plain_builder(StubFetcher::count(1)), store.clone());

        builder.share_response("https://example.com/").await.unwrap();

        let stored = store.get("https://example.com/").expect("Response should be cached");
        let stored = Response::from_cache_value(&stored).unwrap();
        assert_eq!(stored.header(CACHE_HEADER), None);
    }

    #[tokio::test]
    async fn test_distinct_urls_are_cached_separately() {
        let fetcher = StubFetcher::count(3);
        let builder = CachedResponseBuilder::new(
            plain_builder(fetcher.clone()),
            Arc::new(SpyStore::default()),
        );

        builder.share_response("https://example.com/a").await.unwrap();
        builder.share_response("https://example.com/b").await.unwrap();
        builder.share_response("https://example.com/a").await.unwrap();

        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_error_response_never_touches_store() {
        let store = Arc::new(SpyStore::default());
        let builder = CachedResponseBuilder::new(ShareResponseBuilder::new(), store.clone());

        let response = builder.error_response("boom");

        assert_eq!(response.body, r#"{"error":true,"message":"boom"}"#);
        assert_eq!(response.header(CACHE_HEADER), None);
        assert_eq!(store.sets.load(Ordering::SeqCst), 0);
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_aggregation_is_not_cached() {
        let fetcher = StubFetcher::failing("boom");
        let store = Arc::new(SpyStore::default());
        let builder = CachedResponseBuilder::new(plain_builder(fetcher.clone()), store.clone());

        let err = builder.share_response("https://example.com/").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        builder.share_response("https://example.com/").await.unwrap_err();

        assert_eq!(store.sets.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_on_error_response_is_not_cached() {
        let healthy = StubFetcher::count(5);
        let failing = StubFetcher::failing("boom");
        let mut plain = ShareResponseBuilder::new().with_policy(FailurePolicy::ZeroOnError);
        plain.register_fetcher("facebook", healthy.clone());
        plain.register_fetcher("pinterest", failing.clone());
        let store = Arc::new(SpyStore::default());
        let builder = CachedResponseBuilder::new(plain, store.clone());

        let first = builder.share_response("https://example.com/").await.unwrap();
        assert_eq!(first.body, r#"{"error":false,"share":{"facebook":5,"pinterest":0}}"#);
        assert_eq!(first.header(CACHE_HEADER), Some("MISS"));

        let second = builder.share_response("https://example.com/").await.unwrap();
        assert_eq!(second.header(CACHE_HEADER), Some("MISS"));

        assert_eq!(store.sets.load(Ordering::SeqCst), 0);
        assert_eq!(healthy.calls(), 2);
        assert_eq!(failing.calls(), 2);
    }

    /// Store recording the thread each call runs on
    #[derive(Debug, Default)]
    struct ThreadStore {
        threads: Mutex<Vec<std::thread::ThreadId>>,
    }

    impl CacheStore for ThreadStore {
        fn get(&self, _key: &str) -> Option<String> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            None
        }

        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_calls_leave_the_runtime_thread() {
        let store = Arc::new(ThreadStore::default());
        let builder = CachedResponseBuilder::new(plain_builder(StubFetcher::count(1)), store.clone());

        builder.share_response("https://example.com/").await.unwrap();

        let runtime_thread = std::thread::current().id();
        let threads = store.threads.lock().unwrap();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|id| *id != runtime_thread));
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_response() {
        let store = Arc::new(SpyStore {
            fail_sets: true,
            ..Default::default()
        });
        let builder = CachedResponseBuilder::new(plain_builder(StubFetcher::count(9)), store);

        let response = builder.share_response("https://example.com/").await.unwrap();

        assert_eq!(response.body, r#"{"error":false,"share":{"facebook":9}}"#);
        assert_eq!(response.header(CACHE_HEADER), Some("MISS"));
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_is_refetched() {
        let store = Arc::new(SpyStore::default());
        store
            .set("https://example.com/", "not a response", DEFAULT_TTL)
            .unwrap();
        let fetcher = StubFetcher::count(4);
        let builder = CachedResponseBuilder::new(plain_builder(fetcher.clone()), store);

        let response = builder.share_response("https://example.com/").await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(response.header(CACHE_HEADER), Some("MISS"));
    }

    #[tokio::test]
    async fn test_null_store_matches_uncached_builder() {
        let uncached = plain_builder(StubFetcher::count(6));
        let fetcher = StubFetcher::count(6);
        let cached = CachedResponseBuilder::new(plain_builder(fetcher.clone()), Arc::new(NullStore));

        for _ in 0..3 {
            let expected = uncached.share_response("https://example.com/").await.unwrap();
            let actual = cached.share_response("https://example.com/").await.unwrap();
            assert_eq!(actual.body, expected.body);
            assert_eq!(actual.header(CACHE_HEADER), Some("MISS"));
        }
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_register_fetcher_delegates_to_inner() {
        let mut builder =
            CachedResponseBuilder::new(ShareResponseBuilder::new(), Arc::new(NullStore));
        builder.register_fetcher("linkedin", StubFetcher::count(1));

        assert_eq!(builder.inner().fetcher_names().collect::<Vec<_>>(), vec!["linkedin"]);
    }

    #[tokio::test]
    async fn test_file_store_entry_expires_after_ttl() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = FileStore::open(temp_dir.path())
            .unwrap()
            .with_default_ttl(Duration::from_secs(60))
            .with_clock(clock.clone());
        let fetcher = StubFetcher::count(8);
        let builder = CachedResponseBuilder::new(plain_builder(fetcher.clone()), Arc::new(store));

        builder.share_response("https://example.com/").await.unwrap();
        clock.advance(Duration::from_secs(59));
        let hit = builder.share_response("https://example.com/").await.unwrap();
        assert_eq!(hit.header(CACHE_HEADER), Some("HIT"));
        assert_eq!(fetcher.calls(), 1);

        clock.advance(Duration::from_secs(1));
        let refreshed = builder.share_response("https://example.com/").await.unwrap();
        assert_eq!(refreshed.header(CACHE_HEADER), Some("MISS"));
        assert_eq!(fetcher.calls(), 2);
    }
}
