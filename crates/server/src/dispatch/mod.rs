//! Request dispatch: classify the path, run the matching strategy.

mod strategies;

use std::sync::Arc;

use axum::http::HeaderMap;
use portico_client::{Origin, OriginRequest};
use portico_core::cache::hash::compute_cache_key;
use portico_core::{CacheDb, Error, StoredResponse, Strategy, classify};

/// Routes each request through the caching strategy its path classifies to.
///
/// Holds everything the strategies need: the bucket store, the origin
/// client, the current cache version (bucket names derive from it) and the
/// offline fallback path.
#[derive(Clone)]
pub struct Dispatcher {
    db: CacheDb,
    origin: Arc<dyn Origin>,
    version: String,
    offline_path: String,
}

impl Dispatcher {
    pub fn new(db: CacheDb, origin: Arc<dyn Origin>, version: String, offline_path: String) -> Self {
        Self { db, origin, version, offline_path }
    }

    /// Dispatch one request.
    ///
    /// Only GET requests take a caching strategy; everything else is
    /// forwarded to the origin untouched and never stored. Classification
    /// looks at the path alone, but the query string stays part of the
    /// entry identity, so `/photo.jpg?w=800` and `/photo.jpg?w=1600` are
    /// distinct entries.
    pub async fn dispatch(&self, request: OriginRequest, navigation: bool) -> Result<StoredResponse, Error> {
        if request.method != "GET" {
            return self.pass_through(request).await;
        }

        let path = request
            .path_and_query
            .split_once('?')
            .map_or(request.path_and_query.as_str(), |(path, _)| path);
        let route = classify(path);
        let bucket = route.bucket.versioned_name(&self.version);
        let key = compute_cache_key(&request.method, &request.path_and_query);

        match route.strategy {
            Strategy::CacheFirst => self.cache_first(request, &bucket, &key).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, bucket, key).await,
            Strategy::NetworkFirst => self.network_first(request, &bucket, &key, navigation).await,
        }
    }

    async fn pass_through(&self, request: OriginRequest) -> Result<StoredResponse, Error> {
        let response = self.origin.fetch(request).await?;
        Ok(response.to_stored())
    }
}

/// Whether a request is a top-level page navigation.
///
/// Browsers mark navigations with `Sec-Fetch-Mode: navigate`. When that
/// header is absent (older clients, curl), an Accept header asking for
/// HTML is treated as a navigation.
pub fn is_navigation(headers: &HeaderMap) -> bool {
    if let Some(mode) = headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) {
        return mode.eq_ignore_ascii_case("navigate");
    }

    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
