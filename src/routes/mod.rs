//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! A JSON-only API consumed by the browser tutoring client. Every route sits
//! behind a permissive CORS layer and a request trace span. A handler panic
//! becomes a 500 with a JSON error body instead of a dropped connection.

pub mod chat;
pub mod error;
pub mod identity;
pub mod profile;

use std::any::Any as PanicPayload;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat/session", post(chat::create_session))
        .route("/api/chat/message", post(chat::send_message))
        .route("/api/chat/session/{id}", get(chat::get_session))
        .route("/api/chat/sessions", get(chat::list_sessions))
        .route("/api/student-profile", get(profile::get_student_profile))
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", timestamp: OffsetDateTime::now_utc(), environment: state.environment.to_string() })
}

pub(crate) fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Internal server error" }))).into_response()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
