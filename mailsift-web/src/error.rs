//! Web front-end error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while running the server
#[derive(Debug, Error)]
pub enum WebError {
    /// Failed to bind to the specified address
    #[error("Failed to bind web server to {address}: {source}")]
    BindError {
        address: String,
        source: std::io::Error,
    },

    /// The server encountered a runtime error
    #[error("Web server error: {0}")]
    ServerError(String),
}

/// A request that could not be served, rendered as `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
