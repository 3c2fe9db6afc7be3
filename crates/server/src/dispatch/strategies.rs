//! The three caching strategies.
//!
//! Fonts take cache-first, images and css/js take stale-while-revalidate,
//! everything else takes network-first. Only responses with status exactly
//! 200 are ever written to a bucket; any other status flows back to the
//! client uncached.

use portico_client::OriginRequest;
use portico_core::cache::hash::compute_cache_key;
use portico_core::{Error, StoredResponse, valid_bucket_names};

use super::Dispatcher;

impl Dispatcher {
    /// Cache-first: serve from cache, fetch only on a miss.
    ///
    /// Used for fonts, which never change once published. The lookup spans
    /// every current-version bucket, so a precached font is found no matter
    /// which bucket it landed in.
    pub(super) async fn cache_first(
        &self,
        request: OriginRequest,
        bucket: &str,
        key: &str,
    ) -> Result<StoredResponse, Error> {
        let buckets = valid_bucket_names(&self.version);
        if let Some(found) = self.db.match_any(&buckets, key).await? {
            return Ok(found);
        }

        let response = self.origin.fetch(request.clone()).await?;
        let stored = response.to_stored();
        if stored.status == 200 {
            self.db
                .put_entry(bucket, key, &request.method, &request.path_and_query, &stored)
                .await?;
        }
        Ok(stored)
    }

    /// Stale-while-revalidate: answer from cache immediately and refresh
    /// the entry off the request path; fetch in the foreground only on a
    /// miss.
    pub(super) async fn stale_while_revalidate(
        &self,
        request: OriginRequest,
        bucket: String,
        key: String,
    ) -> Result<StoredResponse, Error> {
        if let Some(found) = self.db.match_entry(&bucket, &key).await? {
            self.spawn_revalidation(request, bucket, key);
            return Ok(found);
        }

        let response = self.origin.fetch(request.clone()).await?;
        let stored = response.to_stored();
        if stored.status == 200 {
            self.db
                .put_entry(&bucket, &key, &request.method, &request.path_and_query, &stored)
                .await?;
        }
        Ok(stored)
    }

    /// Refresh one entry in the background.
    ///
    /// The response already went out, so nothing here can affect it. A
    /// failed or non-200 refresh leaves the stale entry in place and is
    /// logged at debug level.
    fn spawn_revalidation(&self, request: OriginRequest, bucket: String, key: String) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            match dispatcher.origin.fetch(request.clone()).await {
                Ok(response) if response.status.as_u16() == 200 => {
                    let stored = response.to_stored();
                    let put = dispatcher
                        .db
                        .put_entry(&bucket, &key, &request.method, &request.path_and_query, &stored)
                        .await;
                    if let Err(e) = put {
                        tracing::debug!(path = %request.path_and_query, error = %e, "revalidation store failed");
                    }
                }
                Ok(response) => {
                    tracing::debug!(
                        path = %request.path_and_query,
                        status = response.status.as_u16(),
                        "revalidation kept stale entry"
                    );
                }
                Err(e) => {
                    tracing::debug!(path = %request.path_and_query, error = %e, "revalidation fetch failed");
                }
            }
        });
    }

    /// Network-first: prefer a live response, fall back to cache when the
    /// origin is unreachable.
    ///
    /// The fallback chain for an unreachable origin is: any cached copy of
    /// the request, then the offline document (navigations only), then a
    /// synthetic 503.
    pub(super) async fn network_first(
        &self,
        request: OriginRequest,
        bucket: &str,
        key: &str,
        navigation: bool,
    ) -> Result<StoredResponse, Error> {
        match self.origin.fetch(request.clone()).await {
            Ok(response) => {
                let stored = response.to_stored();
                if stored.status == 200 {
                    self.db
                        .put_entry(bucket, key, &request.method, &request.path_and_query, &stored)
                        .await?;
                }
                Ok(stored)
            }
            Err(e) => {
                tracing::debug!(path = %request.path_and_query, error = %e, "origin unreachable, trying cache");

                let buckets = valid_bucket_names(&self.version);
                if let Some(found) = self.db.match_any(&buckets, key).await? {
                    return Ok(found);
                }

                if navigation {
                    let offline_key = compute_cache_key("GET", &self.offline_path);
                    if let Some(doc) = self.db.match_any(&buckets, &offline_key).await? {
                        return Ok(doc);
                    }
                }

                Ok(offline_unavailable())
            }
        }
    }
}

/// Synthetic response for requests that cannot be served at all.
fn offline_unavailable() -> StoredResponse {
    StoredResponse::new(
        503,
        vec![("content-type".to_string(), "text/plain".to_string())],
        b"Offline".to_vec(),
    )
}
