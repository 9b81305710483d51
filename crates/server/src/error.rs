//! Structured errors for the layover gateway.
//!
//! These cover the surfaces that answer clients directly (the status
//! endpoint, request parsing). The fetch paths never raise these; they
//! absorb failures into cache fallbacks instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use layover_core::Error;

/// Errors surfaced as HTTP responses by gateway handlers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Core(#[from] Error),

    /// Request path could not be mapped onto the site origin.
    #[error("unroutable request path: {0}")]
    BadPath(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::BadPath(_) => StatusCode::BAD_REQUEST,
            GatewayError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %self, "request failed");
        (status, format!("{self}\n")).into_response()
    }
}
