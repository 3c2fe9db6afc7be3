//! Origin-form path joining.
//!
//! The gateway only ever fetches from its one configured origin, so request
//! targets are restricted to origin-form (`/path?query`). Anything that
//! could point the request at another host is rejected here.

/// Error type for request target validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty request target")]
    Empty,

    #[error("not origin-form: {0}")]
    NotOriginForm(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Join an origin-form request target onto the origin base URL.
///
/// The target must start with a single '/'. A "//host/..." target is
/// rejected because URL resolution would treat it as protocol-relative and
/// swap out the host.
pub fn join_origin(base: &url::Url, path_and_query: &str) -> Result<url::Url, UrlError> {
    if path_and_query.is_empty() {
        return Err(UrlError::Empty);
    }
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return Err(UrlError::NotOriginForm(path_and_query.to_string()));
    }

    base.join(path_and_query).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}
