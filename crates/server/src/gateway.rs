//! The HTTP surface of the gateway.
//!
//! Two admin routes live under `/_portico/`; every other request falls
//! through to strategy dispatch. The fallback is deliberately total: the
//! gateway fronts the whole origin, not a route list.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};

use portico_client::{Origin, OriginRequest};
use portico_core::{AppConfig, Bucket, CacheDb, StoredResponse};

use crate::dispatch::{Dispatcher, is_navigation};
use crate::error::GatewayError;

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct Gateway {
    dispatcher: Dispatcher,
    db: CacheDb,
    version: String,
    photo_cache_cap: u64,
    max_bytes: usize,
}

impl Gateway {
    pub fn new(config: &AppConfig, db: CacheDb, origin: Arc<dyn Origin>) -> Self {
        let dispatcher = Dispatcher::new(
            db.clone(),
            origin,
            config.cache_version.clone(),
            config.offline_path.clone(),
        );
        Self {
            dispatcher,
            db,
            version: config.cache_version.clone(),
            photo_cache_cap: config.photo_cache_cap,
            max_bytes: config.max_bytes,
        }
    }

    /// Build the router: admin endpoints plus the dispatch fallback.
    pub fn router(self) -> Router {
        Router::new()
            .route("/_portico/healthz", get(healthz))
            .route("/_portico/trim", post(trim))
            .fallback(dispatch_request)
            .with_state(self)
    }
}

/// GET /_portico/healthz - liveness probe.
async fn healthz() -> &'static str {
    "ok"
}

/// POST /_portico/trim - trim the photo bucket down to its cap.
///
/// Responds 202 immediately; the eviction runs off the request path and
/// its outcome is only logged.
async fn trim(State(gateway): State<Gateway>) -> StatusCode {
    let bucket = Bucket::Photos.versioned_name(&gateway.version);
    let cap = gateway.photo_cache_cap;
    let db = gateway.db.clone();

    tokio::spawn(async move {
        match db.trim_bucket(&bucket, cap).await {
            Ok(evicted) if evicted > 0 => {
                tracing::info!(bucket = %bucket, evicted, "Trimmed photo cache");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(bucket = %bucket, error = %e, "Photo cache trim failed");
            }
        }
    });

    StatusCode::ACCEPTED
}

/// Fallback handler: translate the incoming request, run it through the
/// strategy its path classifies to, and relay the outcome.
async fn dispatch_request(State(gateway): State<Gateway>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let navigation = is_navigation(&parts.headers);
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());

    let body = match to_bytes(body, gateway.max_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let origin_request = OriginRequest {
        method: parts.method.as_str().to_string(),
        path_and_query,
        headers,
        body: body.to_vec(),
    };

    match gateway.dispatcher.dispatch(origin_request, navigation).await {
        Ok(stored) => into_http_response(stored),
        Err(e) => GatewayError(e).into_response(),
    }
}

/// Render a stored (or passed-through) response for the client.
fn into_http_response(stored: StoredResponse) -> Response {
    let status = StatusCode::from_u16(stored.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &stored.headers {
        builder = builder.header(name, value);
    }

    builder
        .body(Body::from(stored.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_http_response_maps_status_and_headers() {
        let stored = StoredResponse::new(
            200,
            vec![("content-type".to_string(), "text/css".to_string())],
            b"body{}".to_vec(),
        );

        let response = into_http_response(stored);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css");
    }

    #[test]
    fn test_into_http_response_rejects_garbage_status() {
        let stored = StoredResponse::new(99, vec![], Vec::new());
        let response = into_http_response(stored);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_http_response_downgrades_invalid_header_names_to_500() {
        let stored = StoredResponse::new(
            200,
            vec![("bad header name".to_string(), "x".to_string())],
            Vec::new(),
        );

        // A corrupt header downgrades the response rather than panicking.
        let response = into_http_response(stored);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
