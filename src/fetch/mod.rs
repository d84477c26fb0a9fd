//! Share count fetchers
//!
//! A `Fetcher` turns a page URL into a share count for one provider. Fetchers
//! talk to their upstream through an `HttpTransport`, one GET per call, and
//! never retry.

pub mod facebook;
pub mod linkedin;
pub mod pinterest;

pub use facebook::FacebookFetcher;
pub use linkedin::LinkedinFetcher;
pub use pinterest::PinterestFetcher;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::{FetchError, TransportError};

/// Performs an HTTP GET and returns the raw body
///
/// Non-2xx answers are not errors here: upstreams report their own errors in
/// the body, which the fetcher inspects.
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// `HttpTransport` backed by a reqwest client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (timeouts, proxies)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }
}

/// Retrieves the share count of a URL from one provider
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    async fn get_count(&self, url: &str) -> Result<u64, FetchError>;
}

/// Builds `base?name=value&...` with proper query encoding
pub(crate) fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
    reqwest::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))
}

/// Parses an upstream body, treating anything that is not JSON as empty
pub(crate) fn parse_body(body: &str) -> Value {
    match serde_json::from_str(strip_jsonp(body)) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Upstream returned a non-JSON body");
            Value::Null
        }
    }
}

/// Returns the payload of a JSONP answer such as `receiveCount({...})`
pub(crate) fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close => trimmed[open + 1..close].trim(),
        _ => trimmed,
    }
}

/// Fails when the payload carries a truthy `error` field
pub(crate) fn check_upstream_error(payload: &Value, fallback: &str) -> Result<(), FetchError> {
    match payload.get("error") {
        Some(error) if is_truthy(error) => {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or(fallback);
            Err(FetchError::Upstream(message.to_string()))
        }
        _ => Ok(()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Coerces a JSON value to a non-negative count
///
/// Numbers are truncated, strings contribute their leading integer, `true`
/// counts as one. Everything else, and anything negative, is zero.
pub fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

fn leading_integer(s: &str) -> u64 {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

/// Sums a breakdown of engagement sub-counts
pub fn sum_counts<'a>(values: impl IntoIterator<Item = &'a Value>) -> u64 {
    values
        .into_iter()
        .map(coerce_count)
        .fold(0u64, u64::saturating_add)
}
