//! sharecount - social share count aggregator
//!
//! Serves `{"error": false, "share": {...}}` answers over HTTP, or answers one
//! request on stdout.

use std::io;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sharecount::app;
use sharecount::cli::{Cli, Command};
use sharecount::fetch::ReqwestTransport;
use sharecount::handler;
use sharecount::response::{Response, ResponseSender, WriterSender};
use sharecount::server;

/// Logs go to stderr so `fetch` keeps stdout for the response
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sharecount=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let transport = Arc::new(ReqwestTransport::new());

    match cli.command {
        Command::Serve { bind } => {
            let builder = app::build(&cli.config, transport)?;
            let router = server::create_router(Arc::new(builder));

            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!(address = %bind, "Listening");
            axum::serve(listener, router).await?;
        }
        Command::Fetch { url } => {
            // A one-shot request always gets an answer, even for bad configuration.
            let response = match app::build(&cli.config, transport) {
                Ok(builder) => handler::share(&builder, url.as_deref()).await,
                Err(e) => Response::error(&e.to_string()),
            };
            WriterSender::new(io::stdout().lock()).send(response)?;
        }
    }

    Ok(())
}
