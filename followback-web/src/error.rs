//! API error type and its JSON rendering.

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use followback_common::FollowbackError;
use followback_social::GraphError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] FollowbackError),

    #[error("invalid form: {0}")]
    Form(#[from] FormRejection),

    #[error("username must be a GitHub login")]
    InvalidUsername,

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        // Every failure is reported as a client-class error, upstream ones included.
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Graph(e) => tracing::warn!(error = %e, "manage_followers.upstream_failed"),
            other => tracing::info!(error = %other, "manage_followers.rejected"),
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
