//! Tutoring chain: student model, feedback, safety, then questioning.
//!
//! DESIGN
//! ======
//! The chain is fixed and linear: every step runs on every turn, and each
//! step's partial update is overlaid on the running [`AgentState`]. Steps
//! absorb their own failures, so the chain always yields a question.
//!
//! A FLAGGED safety verdict does not change the path: questioning runs with
//! the same inputs either way. The verdict only surfaces through
//! [`agent_status`].

use tracing::info;

use super::agents;
use crate::llm::LlmService;
use crate::models::{AgentActivity, AgentState, AgentStatus, NextAction, SafetyVerdict};
use crate::store::MemStore;

/// Run all four agents in order and return the final state.
pub async fn run_workflow(llm: &LlmService, store: &MemStore, initial: AgentState) -> AgentState {
    let mut state = initial;
    info!(session_id = %state.session_id, user_id = %state.user_id, "workflow: start");

    let update = agents::update_student_model(llm, store, &state).await;
    state.apply(update);

    let update = agents::evaluate_feedback(llm, &state).await;
    state.apply(update);

    let update = agents::check_safety(&state);
    state.apply(update);

    // Flagged and clean turns take the same questioning step.
    let update = agents::generate_question(llm, &state).await;
    state.apply(update);

    info!(
        session_id = %state.session_id,
        safety = ?state.safety_check_result,
        "workflow: complete"
    );
    state
}

/// Per-agent activity labels for the client's status panel.
#[must_use]
pub fn agent_status(state: &AgentState) -> AgentStatus {
    AgentStatus {
        questioning_agent: if state.next_action == NextAction::ReQuestion {
            AgentActivity::Processing
        } else {
            AgentActivity::Active
        },
        student_model_agent: AgentActivity::Idle,
        feedback_agent: AgentActivity::Idle,
        safety_agent: if state.safety_check_result == SafetyVerdict::Flagged {
            AgentActivity::Active
        } else {
            AgentActivity::Idle
        },
    }
}

#[cfg(test)]
#[path = "workflow_test.rs"]
mod tests;
