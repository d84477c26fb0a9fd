//! HTTP response model shared by builders, the cache and senders
//!
//! A `Response` is a plain value: status, reason phrase, ordered headers and a
//! body. It serializes to JSON so the cache can store it and hand back a copy
//! whose headers can still be changed (for the `X-Cache` marker).

mod sender;

pub use sender::{ResponseSender, WriterSender};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Content type carried by every response the builders produce
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Aggregated share counts keyed by provider name, in registration order
pub type AggregatedShare = IndexMap<String, u64>;

/// A status line, headers and body ready to be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: u16,
    pub reason_phrase: String,
    /// Header names are case-sensitive; setting an existing name replaces its value
    pub headers: IndexMap<String, String>,
    pub body: String,
    /// Set when some provider failed and was reported as 0; never persisted
    #[serde(skip)]
    pub partial: bool,
}

#[derive(Serialize)]
struct SharePayload<'a> {
    error: bool,
    share: &'a AggregatedShare,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    error: bool,
    message: &'a str,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status_code: 200,
            reason_phrase: "OK".to_string(),
            headers: IndexMap::new(),
            body: String::new(),
            partial: false,
        }
    }
}

impl Response {
    /// Creates an empty `200 OK` response
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `200 OK` JSON response with the given body
    pub fn json(body: String) -> Self {
        let mut response = Self::new();
        response.set_header("Content-Type", JSON_CONTENT_TYPE);
        response.body = body;
        response
    }

    /// Builds `{"error": false, "share": {...}}`
    pub fn share(share: &AggregatedShare) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(&SharePayload {
            error: false,
            share,
        })?;
        Ok(Self::json(body))
    }

    /// Builds `{"error": true, "message": ...}`
    ///
    /// The status stays 200: failures are reported in the body.
    pub fn error(message: &str) -> Self {
        let body = serde_json::to_string(&ErrorPayload {
            error: true,
            message,
        })
        // Serializing a bool and a str cannot fail.
        .unwrap_or_default();
        Self::json(body)
    }

    /// Sets a header, replacing the value of an existing header with the same name
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Response::set_header`]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Serializes the response for storage in a cache
    pub fn to_cache_value(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuilds a response previously produced by [`Response::to_cache_value`]
    pub fn from_cache_value(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}
