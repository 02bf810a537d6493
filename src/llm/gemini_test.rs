use super::*;

#[test]
fn parse_single_candidate() {
    let json = serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "What would happen if" }, { "text": "the sun vanished?" }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 7, "totalTokenCount": 19 },
        "modelVersion": "gemini-2.5-flash"
    })
    .to_string();

    let resp = parse_response(&json, "requested").unwrap();
    assert_eq!(resp.content.len(), 2);
    assert_eq!(resp.text().as_deref(), Some("What would happen if\nthe sun vanished?"));
    assert_eq!(resp.model, "gemini-2.5-flash");
    assert_eq!(resp.stop_reason, "STOP");
    assert_eq!(resp.input_tokens, 12);
    assert_eq!(resp.output_tokens, 7);
}

#[test]
fn parse_no_candidates_is_empty() {
    let json = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
    let resp = parse_response(json, "gemini-2.5-flash").unwrap();
    assert!(resp.content.is_empty());
    assert!(resp.text().is_none());
    assert_eq!(resp.model, "gemini-2.5-flash");
}

#[test]
fn parse_candidate_without_content() {
    let json = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
    let resp = parse_response(json, "m").unwrap();
    assert!(resp.content.is_empty());
    assert_eq!(resp.stop_reason, "MAX_TOKENS");
}

#[test]
fn parse_invalid_json() {
    let err = parse_response("<html>", "m").unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

#[test]
fn build_request_maps_roles_and_system() {
    let messages = [
        Message::user("hi"),
        Message { role: "assistant".into(), content: "hello".into() },
    ];
    let body = serde_json::to_value(build_request("be Socratic", &messages)).unwrap();
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][1]["role"], "model");
    assert_eq!(body["contents"][1]["parts"][0]["text"], "hello");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be Socratic");
}

#[test]
fn build_request_sends_no_output_cap() {
    let body = serde_json::to_value(build_request("", &[Message::user("x")])).unwrap();
    assert!(body.get("generationConfig").is_none());
    assert!(body.to_string().find("maxOutputTokens").is_none());
}

#[test]
fn build_request_omits_blank_system() {
    let body = serde_json::to_value(build_request("   ", &[Message::user("x")])).unwrap();
    assert!(body.get("systemInstruction").is_none());
}

#[test]
fn endpoint_trims_trailing_slash() {
    let timeouts = LlmTimeouts { request_secs: 1, connect_secs: 1 };
    let client = GeminiClient::new("k".into(), "gemini-2.5-flash".into(), "https://example.test/v1beta/".into(), timeouts)
        .unwrap();
    assert_eq!(client.endpoint(), "https://example.test/v1beta/models/gemini-2.5-flash:generateContent");
}

fn client(key: &str, base_url: &str) -> GeminiClient {
    let timeouts = LlmTimeouts { request_secs: 2, connect_secs: 1 };
    GeminiClient::new(key.into(), "m".into(), base_url.into(), timeouts).unwrap()
}

#[test]
fn api_key_travels_in_header_not_url() {
    let request = client("SECRETKEY123", "https://example.test/v1beta")
        .http_request(&build_request("", &[Message::user("x")]))
        .unwrap();
    assert!(request.url().query().is_none());
    assert!(!request.url().as_str().contains("SECRETKEY123"));
    assert_eq!(request.headers().get(API_KEY_HEADER).unwrap(), "SECRETKEY123");
}

#[tokio::test]
async fn transport_error_does_not_leak_api_key() {
    let err = client("SECRETKEY123", "http://127.0.0.1:1")
        .chat(100, "", &[Message::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::ApiRequest(_)));
    assert!(!err.to_string().contains("SECRETKEY123"));
}
