//! HTTP error mapping for the gateway.
//!
//! A dispatch error becomes a plain-text response whose body is the
//! tagged error message, so failures stay grep-able end to end.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portico_core::Error;

/// Wrapper turning core errors into HTTP responses.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct GatewayError(#[from] pub Error);

impl GatewayError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Upstream(_) | Error::UpstreamTimeout(_) | Error::BodyTooLarge(_) => StatusCode::BAD_GATEWAY,
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::Precache(_) | Error::Database(_) | Error::MigrationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}
