//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the control-plane service.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation errors (map to HTTP 400 Bad Request).
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced document, plugin, or service absent (map to HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Durable-storage write failure (map to HTTP 500).
    #[error("persistence error: {0}")]
    Persistence(String),

    /// All runtime-transport candidates exhausted (map to HTTP 500).
    #[error("runtime connectivity error: {0}")]
    Connectivity(String),

    /// Internal errors (map to HTTP 500).
    #[error("internal error: {0}")]
    Internal(String),

    /// JSON serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML document parse/emit errors.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to an HTTP status code.
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Persistence(_)
            | Error::Connectivity(_)
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Yaml(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// Implement IntoResponse so handlers can use the ? operator directly.
// The body follows the API's standard error envelope.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_http_status();
        let body = Json(serde_json::json!({
            "result": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
