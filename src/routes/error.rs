//! JSON error responses for the REST API.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;

/// One validation problem, addressed by JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn at(field: &str, message: impl Into<String>) -> Self {
        Self { path: vec![field.to_string()], message: message.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body failed to parse or failed a field constraint.
    #[error("invalid request format")]
    Validation(Vec<Issue>),
    #[error("user id required")]
    UserIdRequired,
    #[error("session not found")]
    SessionNotFound,
    /// Unexpected failure. The message is the public text; details are logged
    /// where the error is raised.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UserIdRequired => StatusCode::BAD_REQUEST,
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(vec![Issue { path: Vec::new(), message: rejection.body_text() }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(details) => json!({ "error": "Invalid request format", "details": details }),
            Self::UserIdRequired => json!({ "error": "User ID required" }),
            Self::SessionNotFound => json!({ "error": "Session not found" }),
            Self::Internal(message) => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
