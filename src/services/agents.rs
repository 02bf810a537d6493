//! The four tutoring agents.
//!
//! DESIGN
//! ======
//! Each agent reads the shared [`AgentState`] and returns an [`AgentUpdate`]
//! holding only the fields it produced. Every LLM-backed agent owns its
//! fallback: a failed call is logged and replaced with a canned value, so no
//! agent returns an error.

use rand::seq::IndexedRandom;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use super::safety;
use crate::llm::LlmService;
use crate::models::{AgentState, AgentUpdate, NextAction, ProfileDelta, SafetyVerdict, StudentProfile};
use crate::store::MemStore;

pub const FALLBACK_FEEDBACK: &str =
    "Student is engaging with the material. Continue probing for deeper understanding.";

pub const FALLBACK_QUESTIONS: &[&str] = &[
    "That's interesting! Can you tell me more about what you're thinking?",
    "What makes you feel that way about this topic?",
    "How did you come to that conclusion?",
    "What do you think might happen if we approached this differently?",
];

// =============================================================================
// STUDENT MODEL
// =============================================================================

/// Derive profile deltas from the student's message and merge them into the
/// stored profile.
pub async fn update_student_model(llm: &LlmService, store: &MemStore, state: &AgentState) -> AgentUpdate {
    info!(user_id = %state.user_id, "student model: updating profile");

    let prompt = student_model_prompt(&state.current_question, &state.current_message);
    let delta = match llm.analyze_student_response(&prompt).await {
        Ok(delta) => delta,
        Err(e) => {
            warn!(user_id = %state.user_id, error = %e, "student model: analysis unavailable, logging raw response");
            fallback_profile_delta(&state.current_message, OffsetDateTime::now_utc())
        }
    };

    let profile = store
        .update_student_profile(&state.user_id, &delta)
        .await;
    info!(
        user_id = %state.user_id,
        topics = profile.knowledge_areas.len(),
        misconceptions = profile.misconceptions.len(),
        "student model: profile updated"
    );

    AgentUpdate { student_profile: Some(profile), ..AgentUpdate::next(NextAction::EvaluateFeedback) }
}

fn student_model_prompt(question: &str, response: &str) -> String {
    format!(
        r#"Analyze the following student response to a Socratic question.
Student's last question: "{question}"
Student's response: "{response}"

Based on this, suggest updates to the student's profile in a JSON format.
Focus on:
- 'knowledge_areas': How confident or knowledgeable they seem on related topics (0.0 to 1.0).
- 'misconceptions': Any clear misunderstandings, one count per occurrence in this response.
- 'progress_log': Brief summary of what they demonstrated understanding of.
- 'last_interaction_summary': A concise summary of this turn.

Example JSON format:
{{
  "knowledge_areas": {{"TopicA": 0.7, "TopicB": 0.4}},
  "misconceptions": {{"ConceptX": 1}},
  "progress_log": ["Demonstrated understanding of Y"],
  "last_interaction_summary": "Discussed Z."
}}

Provide only the JSON object."#
    )
}

/// Delta recorded when no analysis provider is reachable: the raw message
/// goes into the progress log.
fn fallback_profile_delta(message: &str, at: OffsetDateTime) -> ProfileDelta {
    let stamp = at
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    ProfileDelta {
        progress_log: vec![format!("{stamp}: {message}")],
        last_interaction_summary: Some(format!("Student said: \"{message}\"")),
        ..ProfileDelta::default()
    }
}

// =============================================================================
// FEEDBACK
// =============================================================================

/// Produce a short internal assessment that steers the next question.
pub async fn evaluate_feedback(llm: &LlmService, state: &AgentState) -> AgentUpdate {
    info!(session_id = %state.session_id, "feedback: evaluating response");

    let prompt = feedback_prompt(&state.current_question, &state.current_message, &state.student_profile);
    let feedback = match llm.call_gemini(&prompt).await {
        Ok(text) => {
            info!(session_id = %state.session_id, feedback = %text, "feedback: evaluated");
            text
        }
        Err(e) => {
            warn!(session_id = %state.session_id, error = %e, "feedback: using fallback");
            FALLBACK_FEEDBACK.to_string()
        }
    };

    AgentUpdate { feedback: Some(feedback), ..AgentUpdate::next(NextAction::CheckSafety) }
}

fn feedback_prompt(question: &str, response: &str, profile: &StudentProfile) -> String {
    let profile_json = serde_json::to_string(profile).unwrap_or_default();
    format!(
        r#"Evaluate the student's response to the Socratic question.
Question: "{question}"
Student Response: "{response}"
Student Profile: {profile_json}

Based on this, determine if the student's response indicates:
1. Good progress towards understanding the concept.
2. Partial understanding, needing further probing.
3. A significant misconception or lack of understanding.

Provide a concise internal feedback string (e.g., "Good progress", "Needs more probing", "Misconception detected").
This feedback will inform the next Socratic question."#
    )
}

// =============================================================================
// SAFETY
// =============================================================================

/// Scan the pending question and the student's message against the denylist.
#[must_use]
pub fn check_safety(state: &AgentState) -> AgentUpdate {
    let hit = safety::flagged_term(&state.current_question).or_else(|| safety::flagged_term(&state.current_message));

    if let Some(term) = hit {
        warn!(session_id = %state.session_id, term, "safety: content flagged");
        return AgentUpdate {
            safety_check_result: Some(SafetyVerdict::Flagged),
            ..AgentUpdate::next(NextAction::ReQuestion)
        };
    }

    info!(session_id = %state.session_id, "safety: clean");
    AgentUpdate { safety_check_result: Some(SafetyVerdict::Clean), ..AgentUpdate::next(NextAction::RespondToStudent) }
}

// =============================================================================
// QUESTIONING
// =============================================================================

/// Generate the next Socratic question.
pub async fn generate_question(llm: &LlmService, state: &AgentState) -> AgentUpdate {
    info!(session_id = %state.session_id, "questioning: crafting prompt");

    let prompt = question_prompt(&state.current_message, &state.student_profile);
    let question = match llm.call_gemini(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(session_id = %state.session_id, error = %e, "questioning: using fallback question");
            fallback_question().to_string()
        }
    };
    info!(session_id = %state.session_id, question_len = question.len(), "questioning: question ready");

    AgentUpdate { current_question: Some(question), ..AgentUpdate::next(NextAction::AwaitStudentResponse) }
}

fn question_prompt(message: &str, profile: &StudentProfile) -> String {
    let profile_json = serde_json::to_string(profile).unwrap_or_default();
    format!(
        r#"You are a Socratic tutor. Your goal is to guide the student to understand a concept by asking thought-provoking questions, not by giving direct answers.

Student's current response: "{message}"
Student's profile summary: {profile_json}

Based on the above, ask a single, open-ended Socratic question or provide a hint that encourages deeper thinking.
Avoid direct answers. Focus on principles, implications, or alternative perspectives.
Keep your response under 200 words and make it engaging."#
    )
}

fn fallback_question() -> &'static str {
    FALLBACK_QUESTIONS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(FALLBACK_QUESTIONS[0])
}

#[cfg(test)]
#[path = "agents_test.rs"]
mod tests;
