//! Student profile route.

use axum::extract::State;
use axum::response::Json;

use super::chat::hydrate_profile;
use super::error::ApiError;
use super::identity::UserIdHeader;
use crate::models::StudentProfile;
use crate::state::AppState;

/// `GET /api/student-profile`
///
/// Unknown users get a freshly created empty profile.
pub async fn get_student_profile(
    State(state): State<AppState>,
    user: UserIdHeader,
) -> Result<Json<StudentProfile>, ApiError> {
    let user_id = user.require()?;
    hydrate_profile(&state, &user_id).await;
    Ok(Json(state.store.student_profile(&user_id).await))
}
