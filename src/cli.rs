//! Command-line interface parsing for sharecount
//!
//! Global options build the `Config`; the subcommand picks how requests
//! arrive: an HTTP server, or a single request answered on stdout.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use crate::config::Config;

/// Aggregate social share counts for a URL
#[derive(Parser, Debug)]
#[command(name = "sharecount")]
#[command(about = "Aggregate social share counts for a URL")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve share counts over HTTP (`GET /?url=...`)
    Serve {
        /// Address to listen on
        #[arg(long, env = "SHARECOUNT_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Answer a single request and write the HTTP response to stdout
    ///
    /// Examples:
    ///   sharecount fetch https://example.com/
    ///   sharecount --no-cache --providers pinterest,linkedin fetch https://example.com/
    Fetch {
        /// Page URL to look up
        url: Option<String>,
    },
}
