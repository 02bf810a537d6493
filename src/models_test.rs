use super::*;

fn sample_profile() -> StudentProfile {
    let mut profile = StudentProfile::new("user_1");
    profile.knowledge_areas.insert("Fractions".into(), 0.6);
    profile.misconceptions.insert("Adding denominators".into(), 2);
    profile.progress_log.push("Simplified 2/4".into());
    profile.learning_style = Some("visual".into());
    profile
}

// =============================================================================
// StudentProfile::merge
// =============================================================================

#[test]
fn new_profile_is_empty() {
    let profile = StudentProfile::new("u");
    assert_eq!(profile.user_id, "u");
    assert!(profile.knowledge_areas.is_empty());
    assert!(profile.misconceptions.is_empty());
    assert!(profile.progress_log.is_empty());
    assert!(profile.learning_style.is_none());
    assert!(profile.last_interaction_summary.is_none());
}

#[test]
fn merge_empty_delta_is_noop() {
    let mut profile = sample_profile();
    let before = profile.clone();
    profile.merge(&ProfileDelta::default());
    assert_eq!(profile, before);
    profile.merge(&ProfileDelta::default());
    assert_eq!(profile, before);
}

#[test]
fn merge_overwrites_and_clamps_confidence() {
    let mut profile = sample_profile();
    let delta = ProfileDelta {
        knowledge_areas: BTreeMap::from([
            ("Fractions".to_string(), 0.9),
            ("Decimals".to_string(), 1.7),
            ("Ratios".to_string(), -0.2),
            ("Broken".to_string(), f64::NAN),
        ]),
        ..ProfileDelta::default()
    };
    profile.merge(&delta);
    assert_eq!(profile.knowledge_areas.get("Fractions"), Some(&0.9));
    assert_eq!(profile.knowledge_areas.get("Decimals"), Some(&1.0));
    assert_eq!(profile.knowledge_areas.get("Ratios"), Some(&0.0));
    assert!(!profile.knowledge_areas.contains_key("Broken"));
}

#[test]
fn merge_accumulates_misconceptions() {
    let mut profile = sample_profile();
    let delta = ProfileDelta {
        misconceptions: BTreeMap::from([
            ("Adding denominators".to_string(), 1.0),
            ("Bigger denominator means bigger".to_string(), 1.0),
            ("Ignored".to_string(), -3.0),
        ]),
        ..ProfileDelta::default()
    };
    profile.merge(&delta);
    assert_eq!(profile.misconceptions.get("Adding denominators"), Some(&3));
    assert_eq!(profile.misconceptions.get("Bigger denominator means bigger"), Some(&1));
    assert!(!profile.misconceptions.contains_key("Ignored"));
}

#[test]
fn merge_appends_and_caps_progress_log() {
    let mut profile = StudentProfile::new("u");
    profile.progress_log = (0..PROGRESS_LOG_LIMIT).map(|i| format!("note {i}")).collect();
    let delta = ProfileDelta { progress_log: vec!["newest".into()], ..ProfileDelta::default() };
    profile.merge(&delta);
    assert_eq!(profile.progress_log.len(), PROGRESS_LOG_LIMIT);
    assert_eq!(profile.progress_log.first().map(String::as_str), Some("note 1"));
    assert_eq!(profile.progress_log.last().map(String::as_str), Some("newest"));
}

#[test]
fn merge_replaces_optional_text_only_when_present() {
    let mut profile = sample_profile();
    profile.merge(&ProfileDelta {
        last_interaction_summary: Some("Discussed equivalence.".into()),
        ..ProfileDelta::default()
    });
    assert_eq!(profile.last_interaction_summary.as_deref(), Some("Discussed equivalence."));
    assert_eq!(profile.learning_style.as_deref(), Some("visual"));
}

// =============================================================================
// ProfileDelta deserialization
// =============================================================================

#[test]
fn delta_missing_fields_default() {
    let delta: ProfileDelta = serde_json::from_str("{}").unwrap();
    assert!(delta.is_empty());
}

#[test]
fn delta_null_progress_log_is_empty() {
    let delta: ProfileDelta = serde_json::from_str(r#"{"progress_log": null}"#).unwrap();
    assert!(delta.progress_log.is_empty());
}

#[test]
fn delta_integer_confidence_accepted() {
    let delta: ProfileDelta = serde_json::from_str(r#"{"knowledge_areas": {"Limits": 1}}"#).unwrap();
    assert_eq!(delta.knowledge_areas.get("Limits"), Some(&1.0));
}

// =============================================================================
// Wire format
// =============================================================================

#[test]
fn enums_use_client_spelling() {
    assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
    assert_eq!(serde_json::to_value(AgentType::StudentModel).unwrap(), "student_model");
    assert_eq!(serde_json::to_value(SafetyVerdict::Flagged).unwrap(), "FLAGGED");
    assert_eq!(serde_json::to_value(NextAction::ReQuestion).unwrap(), "re_question");
    assert_eq!(serde_json::to_value(AgentActivity::Processing).unwrap(), "processing");
}

#[test]
fn chat_message_timestamp_is_rfc3339() {
    let msg = ChatMessage {
        id: Uuid::nil(),
        content: "hi".into(),
        role: Role::User,
        timestamp: OffsetDateTime::UNIX_EPOCH,
        agent_type: None,
        session_id: Uuid::nil(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    assert!(value["agent_type"].is_null());
}

// =============================================================================
// AgentState
// =============================================================================

#[test]
fn agent_state_new_defaults() {
    let state = AgentState::new("u", Uuid::nil(), "why?", Vec::new(), StudentProfile::new("u"));
    assert_eq!(state.current_message, "why?");
    assert_eq!(state.student_response, "why?");
    assert!(state.current_question.is_empty());
    assert_eq!(state.safety_check_result, SafetyVerdict::Clean);
    assert_eq!(state.next_action, NextAction::Start);
}

#[test]
fn agent_state_apply_overlays_only_present_fields() {
    let mut state = AgentState::new("u", Uuid::nil(), "m", Vec::new(), StudentProfile::new("u"));
    state.feedback = "Good progress".into();

    let mut update = AgentUpdate::next(NextAction::CheckSafety);
    update.current_question = Some("What if?".into());
    state.apply(update);

    assert_eq!(state.current_question, "What if?");
    assert_eq!(state.feedback, "Good progress");
    assert_eq!(state.next_action, NextAction::CheckSafety);
}
