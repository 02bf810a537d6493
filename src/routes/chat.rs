//! Chat session routes.
//!
//! DESIGN
//! ======
//! Handlers resolve the caller, touch the store, and hand the turn to the
//! workflow. The workflow never fails, so the only errors these routes return
//! are validation problems, unknown sessions, and store invariant breaks.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use super::error::{ApiError, Issue};
use super::identity::UserIdHeader;
use crate::models::{AgentState, AgentStatus, AgentType, ChatSession, NewMessage, SessionUpdate, StudentProfile};
use crate::services::workflow;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 500;

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl SendMessageRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let chars = self.message.chars().count();
        let problem = if chars == 0 {
            Some("Message must not be empty".to_string())
        } else if chars > MAX_MESSAGE_CHARS {
            Some(format!("Message must be at most {MAX_MESSAGE_CHARS} characters"))
        } else {
            None
        };
        match problem {
            Some(message) => Err(ApiError::Validation(vec![Issue::at("message", message)])),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub session_id: Uuid,
    pub response: String,
    pub student_profile_summary: StudentProfile,
    pub agent_status: AgentStatus,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/chat/session`
pub async fn create_session(
    State(state): State<AppState>,
    user: UserIdHeader,
) -> Json<CreateSessionResponse> {
    let user_id = user.or_generate();
    hydrate_profile(&state, &user_id).await;

    let session = state.store.create_session(&user_id).await;
    info!(session_id = %session.id, %user_id, "chat: session created");
    state.mirror.save_session(&session).await;

    Json(CreateSessionResponse { session_id: session.id, user_id: session.user_id, created_at: session.created_at })
}

/// `POST /api/chat/message`
pub async fn send_message(
    State(state): State<AppState>,
    user: UserIdHeader,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body?;
    body.validate()?;

    let (session_id, user_id) = resolve_session(&state, body.session_id.as_deref(), user).await;

    state
        .store
        .add_message(session_id, NewMessage::user(body.message.as_str()))
        .await
        .map_err(|e| store_failure(&e, "Failed to process message"))?;

    let history = state.store.messages(session_id).await;
    let profile = state.store.student_profile(&user_id).await;
    let initial = AgentState::new(user_id.as_str(), session_id, body.message, history, profile);

    let final_state = workflow::run_workflow(&state.llm, &state.store, initial).await;

    state
        .store
        .add_message(session_id, NewMessage::assistant(final_state.current_question.as_str(), AgentType::Questioning))
        .await
        .map_err(|e| store_failure(&e, "Failed to process message"))?;

    let session = state
        .store
        .update_session(
            session_id,
            SessionUpdate { student_profile: Some(final_state.student_profile.clone()) },
        )
        .await
        .map_err(|e| store_failure(&e, "Failed to process message"))?;

    state
        .mirror
        .save_student_profile(&user_id, &final_state.student_profile)
        .await;
    state.mirror.save_session(&session).await;

    let agent_status = workflow::agent_status(&final_state);
    Ok(Json(MessageResponse {
        session_id,
        response: final_state.current_question,
        student_profile_summary: final_state.student_profile,
        agent_status,
    }))
}

/// `GET /api/chat/session/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatSession>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::SessionNotFound)?;
    state
        .store
        .get_session(id)
        .await
        .map(Json)
        .ok_or(ApiError::SessionNotFound)
}

/// `GET /api/chat/sessions`
pub async fn list_sessions(
    State(state): State<AppState>,
    user: UserIdHeader,
) -> Result<Json<Vec<ChatSession>>, ApiError> {
    let user_id = user.require()?;
    Ok(Json(state.store.sessions_by_user(&user_id).await))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Restore a mirrored profile the first time this process sees a user.
pub(crate) async fn hydrate_profile(state: &AppState, user_id: &str) {
    if !state.mirror.is_enabled() || state.store.has_profile(user_id).await {
        return;
    }
    if let Some(profile) = state.mirror.get_student_profile(user_id).await
        && state.store.seed_profile(profile).await
    {
        info!(%user_id, "chat: profile restored from mirror");
    }
}

/// Pick the session this turn belongs to and the user it is attributed to.
///
/// An existing session is reused when the caller owns it or sent no user id.
/// Unknown or malformed ids, and sessions owned by someone else, start a new
/// session for the caller.
async fn resolve_session(state: &AppState, requested: Option<&str>, user: UserIdHeader) -> (Uuid, String) {
    let existing = match requested.map(str::trim).and_then(|raw| Uuid::parse_str(raw).ok()) {
        Some(id) => state.store.get_session(id).await,
        None => None,
    };

    let user_id = match (&existing, user.0) {
        (Some(session), None) => session.user_id.clone(),
        (_, Some(header)) => header,
        (None, None) => super::identity::generate_user_id(),
    };

    if let Some(session) = existing
        && session.user_id == user_id
    {
        return (session.id, user_id);
    }

    hydrate_profile(state, &user_id).await;
    let session = state.store.create_session(&user_id).await;
    info!(session_id = %session.id, %user_id, "chat: session created for message");
    (session.id, user_id)
}

fn store_failure(err: &crate::store::StoreError, public: &'static str) -> ApiError {
    error!(error = %err, "chat: store operation failed");
    ApiError::Internal(public)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
