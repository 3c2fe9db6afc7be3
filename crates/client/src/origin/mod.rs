//! HTTP access to the single configured origin.
//!
//! Everything the gateway forwards goes through the [`Origin`] trait. The
//! production implementation is [`HttpOrigin`], a reqwest client pinned to
//! one base URL; requests carry only an origin-form path, so a caller can
//! never talk the gateway into fetching a foreign host.
//!
//! ### Response handling
//! - Any status code is returned as a success at this layer. Whether a
//!   non-200 response is usable is the caller's decision.
//! - Bodies are capped at `max_bytes`, checked against Content-Length
//!   before the read and against the actual size after.
//! - Transport failures and timeouts map to distinct error variants so
//!   strategies can tell "origin down" from "origin slow".

pub mod headers;
pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode, Url, header::HeaderMap};

pub use headers::{forward_headers, is_hop_by_hop, relay_headers};
pub use url::{UrlError, join_origin};

use portico_core::{Error, StoredResponse};

/// Settings for [`HttpOrigin`].
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// Scheme, host, and port of the origin, e.g. "http://127.0.0.1:3000".
    pub base_url: String,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Largest body the client will accept, in bytes.
    pub max_bytes: usize,

    /// Hard deadline per request, connect and read included.
    pub timeout: Duration,

    /// How many redirects to follow before giving up.
    pub max_redirects: usize,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            user_agent: "portico/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_secs(10),
            max_redirects: 5,
        }
    }
}

/// A request to forward to the origin.
///
/// The target is origin-form only (`/path?query`); the host comes from the
/// client's configured base URL.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    /// HTTP method name, e.g. "GET".
    pub method: String,
    /// Path plus optional query string, starting with '/'.
    pub path_and_query: String,
    /// Request headers to forward (hop-by-hop headers are stripped).
    pub headers: Vec<(String, String)>,
    /// Request body; empty for bodiless methods.
    pub body: Vec<u8>,
}

impl OriginRequest {
    /// Build a bare GET request for a path.
    pub fn get(path_and_query: &str) -> Self {
        Self {
            method: "GET".to_string(),
            path_and_query: path_and_query.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// A fully read origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Wall time the fetch took, in milliseconds.
    pub elapsed_ms: u64,
}

impl OriginResponse {
    /// Convert into the storage representation, dropping hop-by-hop headers.
    pub fn to_stored(&self) -> StoredResponse {
        StoredResponse::new(self.status.as_u16(), relay_headers(&self.headers), self.body.to_vec())
    }
}

/// Access to the origin server.
///
/// Implemented by [`HttpOrigin`] in production and by in-memory fakes in
/// tests.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Forward a request to the origin and read the full response body.
    ///
    /// Non-2xx statuses are still `Ok`; errors mean the origin could not be
    /// reached, timed out, or the body exceeded the byte cap.
    async fn fetch(&self, request: OriginRequest) -> Result<OriginResponse, Error>;
}

/// HTTP origin client pinned to one base URL.
pub struct HttpOrigin {
    http: Client,
    base: Url,
    config: OriginConfig,
}

impl HttpOrigin {
    /// Create a new origin client with the given configuration.
    pub fn new(config: OriginConfig) -> Result<Self, Error> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        match base.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::InvalidUrl(format!("unsupported origin scheme: {scheme}")));
            }
        }

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base, config })
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: OriginRequest) -> Result<OriginResponse, Error> {
        let start = Instant::now();
        let url = join_origin(&self.base, &request.path_and_query).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let mut req = self.http.request(method, url.clone());
        for (name, value) in forward_headers(&request.headers) {
            req = req.header(name, value);
        }
        if !request.body.is_empty() {
            req = req.body(request.body);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::UpstreamTimeout(format!("{url}: {e}"))
            } else {
                Error::Upstream(format!("{url}: {e}"))
            }
        })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::BodyTooLarge(format!(
                "content-length {len} over the {} byte cap",
                self.config.max_bytes
            )));
        }

        let headers = response.headers().clone();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::BodyTooLarge(format!(
                "body is {} bytes, cap is {}",
                body.len(),
                self.config.max_bytes
            )));
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            url,
            status.as_u16(),
            elapsed_ms,
            body.len()
        );

        Ok(OriginResponse { status, headers, body, elapsed_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_config_default() {
        let config = OriginConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.user_agent, "portico/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_get_request_shape() {
        let request = OriginRequest::get("/styles.css?v=2");
        assert_eq!(request.method, "GET");
        assert_eq!(request.path_and_query, "/styles.css?v=2");
        assert!(request.headers.is_empty());
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_to_stored_strips_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/css".parse().unwrap());
        headers.insert("connection", "keep-alive".parse().unwrap());

        let response = OriginResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"body{}"),
            elapsed_ms: 3,
        };

        let stored = response.to_stored();
        assert_eq!(stored.status, 200);
        assert_eq!(stored.body, b"body{}");
        assert!(stored.headers.iter().any(|(n, _)| n == "content-type"));
        assert!(!stored.headers.iter().any(|(n, _)| n == "connection"));
    }

    #[tokio::test]
    async fn test_http_origin_new() {
        let origin = HttpOrigin::new(OriginConfig::default());
        assert!(origin.is_ok());
    }

    #[tokio::test]
    async fn test_http_origin_rejects_bad_base() {
        let config = OriginConfig { base_url: "ftp://files.local".to_string(), ..Default::default() };
        let result = HttpOrigin::new(config);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_http_origin_rejects_unparsable_base() {
        let config = OriginConfig { base_url: "not a url".to_string(), ..Default::default() };
        let result = HttpOrigin::new(config);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
