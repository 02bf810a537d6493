use super::*;
use crate::state::test_helpers::test_app_state;

fn body(message: &str) -> SendMessageRequest {
    SendMessageRequest { message: message.to_string(), session_id: None }
}

#[test]
fn validate_counts_characters_not_bytes() {
    let accented = "é".repeat(MAX_MESSAGE_CHARS);
    assert!(accented.len() > MAX_MESSAGE_CHARS);
    assert!(body(&accented).validate().is_ok());
}

#[test]
fn validate_rejects_empty() {
    let err = body("").validate().unwrap_err();
    let ApiError::Validation(issues) = err else {
        panic!("expected validation error");
    };
    assert_eq!(issues[0].path, vec!["message".to_string()]);
}

#[test]
fn validate_keeps_whitespace_only_messages() {
    assert!(body("   ").validate().is_ok());
}

#[tokio::test]
async fn resolve_reuses_owned_session() {
    let state = test_app_state();
    let session = state.store.create_session("owner").await;
    let raw = session.id.to_string();

    let (id, user) = resolve_session(&state, Some(&raw), UserIdHeader(Some("owner".into()))).await;
    assert_eq!(id, session.id);
    assert_eq!(user, "owner");
}

#[tokio::test]
async fn resolve_adopts_owner_without_header() {
    let state = test_app_state();
    let session = state.store.create_session("owner").await;
    let raw = session.id.to_string();

    let (id, user) = resolve_session(&state, Some(&raw), UserIdHeader(None)).await;
    assert_eq!(id, session.id);
    assert_eq!(user, "owner");
}

#[tokio::test]
async fn resolve_forks_foreign_session() {
    let state = test_app_state();
    let session = state.store.create_session("owner").await;
    let raw = session.id.to_string();

    let (id, user) = resolve_session(&state, Some(&raw), UserIdHeader(Some("intruder".into()))).await;
    assert_ne!(id, session.id);
    assert_eq!(user, "intruder");
    assert_eq!(state.store.get_session(id).await.unwrap().user_id, "intruder");
}

#[tokio::test]
async fn resolve_malformed_id_creates_session() {
    let state = test_app_state();
    let (id, user) = resolve_session(&state, Some("nope"), UserIdHeader(None)).await;
    assert!(user.starts_with("user_"));
    assert_eq!(state.store.get_session(id).await.unwrap().user_id, user);
}

#[tokio::test]
async fn hydrate_is_noop_without_mirror() {
    let state = test_app_state();
    hydrate_profile(&state, "u").await;
    assert!(!state.store.has_profile("u").await);
}
