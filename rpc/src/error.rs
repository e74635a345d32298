//! HTTP error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    /// The request body or query could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The intent was well-formed but refused by admission.
    #[error("intent rejected: {0}")]
    Rejected(String),

    #[error("a block production cycle is already in progress")]
    CycleInProgress,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RpcError::CycleInProgress => StatusCode::CONFLICT,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Store(_) | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({ "ok": false, "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
