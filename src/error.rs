//! Error types for the request governor
//!
//! Provides unified error handling using thiserror. The governance core
//! absorbs these internally; only the HTTP layer ever turns one into a
//! response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Governor Error Enum ==
/// Unified error type for the request governor.
#[derive(Error, Debug)]
pub enum GovernorError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable record could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Payload could not be shrunk
    #[error("Compression error: {0}")]
    Compression(String),

    /// Hosted backend returned an error or could not be reached
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream attempt exceeded the request timeout
    #[error("Upstream request timed out after {0}ms")]
    Timeout(u64),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No data could be served (offline, quota spent or upstream down, and nothing cached)
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for GovernorError {
    fn into_response(self) -> Response {
        let status = match &self {
            GovernorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GovernorError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GovernorError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GovernorError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GovernorError::Io(_)
            | GovernorError::Serialization(_)
            | GovernorError::Persistence(_)
            | GovernorError::Compression(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the request governor.
pub type Result<T> = std::result::Result<T, GovernorError>;
