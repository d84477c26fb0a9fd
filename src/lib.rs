//! Sharecount library
//!
//! Aggregates share counts from social providers into one JSON response, with
//! a file-backed TTL cache in front of the upstream calls.

pub mod app;
pub mod builder;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod response;
pub mod server;

pub use builder::{CachedResponseBuilder, FailurePolicy, ResponseBuilder, ShareResponseBuilder};
pub use cache::{CacheStore, FileStore, NullStore};
pub use error::{Error, FetchError};
pub use fetch::Fetcher;
pub use response::Response;
