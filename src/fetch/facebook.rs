//! Facebook Graph API fetcher
//!
//! Reads the `engagement` field of the URL node and sums every sub-count
//! (reactions, comments, shares, plugin comments).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{build_url, check_upstream_error, parse_body, sum_counts, Fetcher, HttpTransport};
use crate::error::FetchError;

/// Graph API endpoint for URL nodes
const GRAPH_API_URL: &str = "https://graph.facebook.com/v3.2/";

/// Message used when the Graph API reports an error without text
const GENERIC_ERROR: &str = "An error has occurred with the Facebook API call.";

/// Fetches engagement counts from the Facebook Graph API
#[derive(Debug, Clone)]
pub struct FacebookFetcher {
    transport: Arc<dyn HttpTransport>,
    app_id: String,
    app_secret: String,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl FacebookFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            base_url: GRAPH_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, url: &str) -> Result<String, FetchError> {
        let access_token = format!("{}|{}", self.app_id, self.app_secret);
        build_url(
            &self.base_url,
            &[
                ("id", url),
                ("fields", "engagement"),
                ("access_token", access_token.as_str()),
            ],
        )
    }
}

/// Extracts the summed engagement from a Graph API answer
fn parse_engagement(payload: &Value) -> Result<u64, FetchError> {
    check_upstream_error(payload, GENERIC_ERROR)?;

    Ok(match payload.get("engagement") {
        Some(Value::Object(breakdown)) => sum_counts(breakdown.values()),
        Some(Value::Array(breakdown)) => sum_counts(breakdown),
        _ => 0,
    })
}

#[async_trait]
impl Fetcher for FacebookFetcher {
    async fn get_count(&self, url: &str) -> Result<u64, FetchError> {
        let body = self.transport.get(&self.request_url(url)?).await?;
        parse_engagement(&parse_body(&body))
    }
}
