//! The HTTP surface: request interception and the status endpoint.
//!
//! Every path outside `/layover/` is treated as an intercepted site request
//! and resolved by the worker; the reply is the stored or live response
//! replayed as-is, minus transfer-shape headers. `/layover/status` reports
//! the current generation and what storage holds.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use layover_client::resolve_entry;

use crate::error::GatewayError;
use crate::worker::{CacheWorker, FetchOutcome, ServedResponse, WorkerStatus, events::EventTracker};

/// Shared state for all gateway handlers.
#[derive(Clone)]
pub struct AppState {
    pub worker: CacheWorker,
    pub events: EventTracker,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/layover/status", get(status))
        .fallback(serve_site)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Result<Json<WorkerStatus>, GatewayError> {
    Ok(Json(state.worker.status().await?))
}

/// Resolve an intercepted site request through the worker.
///
/// The fetch runs as a dispatched event: a client that disconnects early
/// cancels this handler, not the fetch or its store.
async fn serve_site(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "layover only proxies GET\n").into_response();
    }

    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = match resolve_entry(state.worker.origin(), path) {
        Ok(url) => url,
        Err(e) => return GatewayError::BadPath(e.to_string()).into_response(),
    };

    let worker = state.worker.clone();
    let event = state.events.dispatch(async move { worker.handle_fetch(&url).await });

    match event.await {
        Ok(FetchOutcome::Response(served)) => replay(served),
        Ok(FetchOutcome::Unavailable) => {
            (StatusCode::BAD_GATEWAY, "offline and not cached\n").into_response()
        }
        Err(e) => {
            warn!(error = %e, "fetch event aborted");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Replay a served response to the client.
fn replay(served: ServedResponse) -> Response {
    let mut headers = HeaderMap::new();
    for (name, value) in served.headers.iter().filter(|(name, _)| !is_transfer_header(name)) {
        headers.append(name.clone(), value.clone());
    }
    headers.insert(
        HeaderName::from_static("x-layover-source"),
        HeaderValue::from_static(served.source.as_str()),
    );

    (served.status, headers, served.body).into_response()
}

/// Headers that describe the original transfer rather than the replayed
/// body (which is already decompressed and re-framed).
fn is_transfer_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
            | "content-encoding"
    )
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::worker::ServeSource;

    use super::*;

    #[test]
    fn test_replay_strips_transfer_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/css"));
        headers.insert("content-length", HeaderValue::from_static("999"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("cache-control", HeaderValue::from_static("max-age=60"));

        let response = replay(ServedResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"body{}"),
            source: ServeSource::Cache,
        });

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("content-type").unwrap(), "text/css");
        assert_eq!(headers.get("cache-control").unwrap(), "max-age=60");
        assert_eq!(headers.get("x-layover-source").unwrap(), "cache");
        assert!(headers.get("transfer-encoding").is_none());
    }

    #[test]
    fn test_replay_marks_network_source() {
        let response = replay(ServedResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            source: ServeSource::Network,
        });

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("x-layover-source").unwrap(), "network");
    }

    #[test]
    fn test_transfer_header_set() {
        assert!(is_transfer_header(&HeaderName::from_static("content-encoding")));
        assert!(is_transfer_header(&HeaderName::from_static("connection")));
        assert!(!is_transfer_header(&HeaderName::from_static("content-type")));
        assert!(!is_transfer_header(&HeaderName::from_static("etag")));
    }
}
