//! Fallback handler: every request not matched by the API goes through the
//! offline cache manager.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::request::{AssetRequest, AssetResponse};
use crate::server::api::AppState;

/// Marks whether a response came from the cache (`hit`) or the network (`miss`).
pub const CACHE_HEADER: &str = "x-pocket-cache";

// Hop-by-hop or recomputed by the server.
const SKIPPED_HEADERS: &[&str] = &["connection", "content-length", "transfer-encoding"];

/// Only the method and path-and-query reach the manager; request headers and
/// bodies are not forwarded upstream.
pub async fn intercept(State(state): State<Arc<AppState>>, method: Method, uri: Uri) -> Response {
    let request_id = Uuid::new_v4();
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let request = AssetRequest::new(method.as_str(), url);

    match state.manager.handle(&request).await {
        Ok(served) => {
            let marker = if served.is_cache_hit() { "hit" } else { "miss" };
            debug!(%request_id, request = %request, cache = marker, status = served.response.status, "Served asset");
            into_http(served.response, marker)
        }
        Err(e) => {
            warn!(%request_id, request = %request, error = %e, "Asset request failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

fn into_http(asset: AssetResponse, marker: &'static str) -> Response {
    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = StatusCode::from_u16(asset.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let headers = response.headers_mut();
    for (name, value) in &asset.headers {
        if SKIPPED_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = %name, "Dropping unrepresentable header"),
        }
    }
    headers.insert(
        HeaderName::from_static(CACHE_HEADER),
        HeaderValue::from_static(marker),
    );
    response
}
