use super::*;

// =============================================================================
// LlmError::retryable
// =============================================================================

#[test]
fn retryable_api_request() {
    let err = LlmError::ApiRequest("conn refused".into());
    assert!(err.retryable());
}

#[test]
fn retryable_api_response_429() {
    let err = LlmError::ApiResponse { status: 429, body: "rate limited".into() };
    assert!(err.retryable());
}

#[test]
fn retryable_api_response_503() {
    let err = LlmError::ApiResponse { status: 503, body: "unavailable".into() };
    assert!(err.retryable());
}

#[test]
fn not_retryable_api_response_401() {
    let err = LlmError::ApiResponse { status: 401, body: "unauthorized".into() };
    assert!(!err.retryable());
}

#[test]
fn not_retryable_not_configured() {
    assert!(!LlmError::NotConfigured("gemini").retryable());
}

#[test]
fn error_display_includes_status() {
    let err = LlmError::ApiResponse { status: 502, body: String::new() };
    assert_eq!(err.to_string(), "API response error: status 502");
}

// =============================================================================
// ChatResponse::text
// =============================================================================

fn response(content: Vec<ContentBlock>) -> ChatResponse {
    ChatResponse { content, model: "mock".into(), stop_reason: "end_turn".into(), input_tokens: 0, output_tokens: 0 }
}

#[test]
fn text_joins_text_blocks() {
    let resp = response(vec![
        ContentBlock::Text { text: "What do you".into() },
        ContentBlock::Unknown,
        ContentBlock::Text { text: "think?".into() },
    ]);
    assert_eq!(resp.text().as_deref(), Some("What do you\nthink?"));
}

#[test]
fn text_none_when_only_whitespace() {
    let resp = response(vec![ContentBlock::Text { text: "  \n".into() }]);
    assert!(resp.text().is_none());
}

#[test]
fn text_none_when_empty() {
    assert!(response(Vec::new()).text().is_none());
}

#[test]
fn content_block_unknown_type_deserializes() {
    let block: ContentBlock = serde_json::from_str(r#"{"type":"tool_use","id":"x"}"#).unwrap();
    assert!(matches!(block, ContentBlock::Unknown));
}

#[test]
fn message_user_sets_role() {
    let msg = Message::user("hi");
    assert_eq!(msg.role, "user");
    assert_eq!(msg.content, "hi");
}

#[test]
fn content_block_thinking_is_unknown() {
    let block: ContentBlock = serde_json::from_str(r#"{"type":"thinking","thinking":"hmm","signature":"s"}"#).unwrap();
    assert!(matches!(block, ContentBlock::Unknown));
}
