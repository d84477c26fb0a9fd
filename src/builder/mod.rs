//! Response builders
//!
//! `ShareResponseBuilder` runs every registered fetcher for a URL and folds the
//! counts into one JSON response. `CachedResponseBuilder` wraps any builder and
//! serves repeated URLs from a cache store.

mod cached;

pub use cached::{CachedResponseBuilder, CACHE_HEADER};

use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Error;
use crate::fetch::Fetcher;
use crate::response::{AggregatedShare, Response};

/// Builds share and error responses
#[async_trait]
pub trait ResponseBuilder: Send + Sync {
    /// Adds a provider, replacing any fetcher already registered under `name`
    fn register_fetcher(&mut self, name: &str, fetcher: Arc<dyn Fetcher>);

    /// Aggregates the counts of every registered provider for `url`
    async fn share_response(&self, url: &str) -> Result<Response, Error>;

    /// Builds an `{"error": true, "message": ...}` response
    fn error_response(&self, message: &str) -> Response {
        Response::error(message)
    }
}

/// What to do when one provider fails during aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The whole aggregation fails with the provider's error
    #[default]
    FailFast,
    /// The failing provider is reported with a count of 0 and the response is
    /// marked partial
    ZeroOnError,
}

/// Aggregates counts from a registry of fetchers
#[derive(Debug, Default)]
pub struct ShareResponseBuilder {
    fetchers: IndexMap<String, Arc<dyn Fetcher>>,
    policy: FailurePolicy,
}

impl ShareResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Provider names in registration order
    pub fn fetcher_names(&self) -> impl Iterator<Item = &str> {
        self.fetchers.keys().map(String::as_str)
    }
}

#[async_trait]
impl ResponseBuilder for ShareResponseBuilder {
    fn register_fetcher(&mut self, name: &str, fetcher: Arc<dyn Fetcher>) {
        self.fetchers.insert(name.to_string(), fetcher);
    }

    async fn share_response(&self, url: &str) -> Result<Response, Error> {
        // Providers are independent; run them together and reassemble in order.
        let results = join_all(
            self.fetchers
                .iter()
                .map(|(name, fetcher)| async move { (name, fetcher.get_count(url).await) }),
        )
        .await;

        let mut share = AggregatedShare::with_capacity(results.len());
        let mut partial = false;
        for (name, result) in results {
            let count = match result {
                Ok(count) => count,
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => return Err(e.into()),
                    FailurePolicy::ZeroOnError => {
                        warn!(provider = %name, url = %url, error = %e, "Provider failed, reporting 0");
                        partial = true;
                        0
                    }
                },
            };
            share.insert(name.clone(), count);
        }

        debug!(url = %url, providers = share.len(), "Share counts aggregated");
        let mut response = Response::share(&share)?;
        response.partial = partial;
        Ok(response)
    }
}
