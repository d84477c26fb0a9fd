//! HTTP server exposing the share count endpoint

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing::warn;

use crate::builder::ResponseBuilder;
use crate::handler;
use crate::response::Response;

/// Builder shared by every request
pub type SharedBuilder = Arc<dyn ResponseBuilder>;

/// Query string as decoded pairs, in request order
type QueryPairs = Vec<(String, String)>;

/// Creates the router: `GET /?url=...` and `GET /health`
pub fn create_router(builder: SharedBuilder) -> Router {
    Router::new()
        .route("/", get(share_handler))
        .route("/health", get(health_handler))
        .with_state(builder)
}

async fn share_handler(
    State(builder): State<SharedBuilder>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(pairs)) => handler::share(builder.as_ref(), url_param(&pairs)).await,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable query string");
            builder.error_response(&rejection.body_text())
        }
    }
}

/// The last `url` parameter wins when it is repeated
fn url_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .rev()
        .find(|(name, _)| name == "url")
        .map(|(_, value)| value.as_str())
}

async fn health_handler() -> &'static str {
    "OK"
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "Skipping invalid response header"),
            }
        }
        response
    }
}
