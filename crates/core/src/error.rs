//! Unified error types for portico.
//!
//! Every variant carries a stable SCREAMING_TAG prefix in its Display
//! output so log lines and HTTP error bodies stay grep-able.

use tokio_rusqlite::rusqlite;

/// Unified error types for the portico gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a malformed request method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or non-origin-form URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The origin could not be reached (connect/read failure).
    #[error("UPSTREAM_UNREACHABLE: {0}")]
    Upstream(String),

    /// The origin did not answer within the configured timeout.
    #[error("UPSTREAM_TIMEOUT: {0}")]
    UpstreamTimeout(String),

    /// The origin response body exceeds the configured byte cap.
    #[error("RESPONSE_TOO_LARGE: {0}")]
    BodyTooLarge(String),

    /// A precache asset failed during install; nothing was committed.
    #[error("PRECACHE_FAILED: {0}")]
    Precache(String),

    /// The SQLite store rejected an operation.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// A schema batch did not apply cleanly.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
