//! Request entry point shared by the HTTP server and the one-shot command

use tracing::warn;

use crate::builder::ResponseBuilder;
use crate::response::Response;

/// Message returned when the request carries no URL
pub const MISSING_URL_MESSAGE: &str = "You must specify an URL.";

/// An empty value or `"0"` counts as no URL
fn is_present(url: &str) -> bool {
    !url.is_empty() && url != "0"
}

/// Answers a share count request
///
/// Never fails: a missing URL or any builder error becomes an error response.
pub async fn share<B: ResponseBuilder + ?Sized>(builder: &B, url: Option<&str>) -> Response {
    let url = match url.filter(|url| is_present(url)) {
        Some(url) => url,
        None => return builder.error_response(MISSING_URL_MESSAGE),
    };

    match builder.share_response(url).await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "Share request failed");
            builder.error_response(&e.to_string())
        }
    }
}
