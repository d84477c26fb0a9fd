//! LinkedIn share count fetcher

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{build_url, check_upstream_error, coerce_count, parse_body, Fetcher, HttpTransport};
use crate::error::FetchError;

const COUNT_API_URL: &str = "https://www.linkedin.com/countserv/count/share";

const GENERIC_ERROR: &str = "An error has occurred with the LinkedIn API call.";

#[derive(Debug, Clone)]
pub struct LinkedinFetcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl LinkedinFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: COUNT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn parse_share_count(payload: &Value) -> Result<u64, FetchError> {
    check_upstream_error(payload, GENERIC_ERROR)?;
    Ok(payload.get("count").map(coerce_count).unwrap_or(0))
}

#[async_trait]
impl Fetcher for LinkedinFetcher {
    async fn get_count(&self, url: &str) -> Result<u64, FetchError> {
        let request_url = build_url(&self.base_url, &[("url", url), ("format", "json")])?;
        let body = self.transport.get(&request_url).await?;
        parse_share_count(&parse_body(&body))
    }
}
