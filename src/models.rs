//! Domain types shared by the store, the agent chain and the HTTP layer.
//!
//! Field names are the JSON wire names the browser client reads.

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Most recent progress notes kept on a profile.
pub const PROGRESS_LOG_LIMIT: usize = 50;

// =============================================================================
// STUDENT PROFILE
// =============================================================================

/// Accumulated per-user model of topic confidence and misconceptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub user_id: String,
    /// Topic → confidence in `[0, 1]`.
    pub knowledge_areas: BTreeMap<String, f64>,
    /// Misconception label → occurrence count.
    pub misconceptions: BTreeMap<String, u32>,
    pub progress_log: Vec<String>,
    pub learning_style: Option<String>,
    pub last_interaction_summary: Option<String>,
}

impl StudentProfile {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            knowledge_areas: BTreeMap::new(),
            misconceptions: BTreeMap::new(),
            progress_log: Vec::new(),
            learning_style: None,
            last_interaction_summary: None,
        }
    }

    /// Fold a partial update into this profile.
    ///
    /// Confidence values overwrite per topic and are clamped to `[0, 1]`.
    /// Misconception counts accumulate. Progress notes append and the log is
    /// trimmed to the last [`PROGRESS_LOG_LIMIT`] entries. Non-finite or
    /// negative numbers are dropped.
    pub fn merge(&mut self, delta: &ProfileDelta) {
        for (topic, confidence) in &delta.knowledge_areas {
            if confidence.is_finite() {
                self.knowledge_areas
                    .insert(topic.clone(), confidence.clamp(0.0, 1.0));
            }
        }

        for (label, count) in &delta.misconceptions {
            if !count.is_finite() || *count < 0.0 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let increment = count.round().min(f64::from(u32::MAX)) as u32;
            let entry = self.misconceptions.entry(label.clone()).or_insert(0);
            *entry = entry.saturating_add(increment);
        }

        self.progress_log
            .extend(delta.progress_log.iter().cloned());
        if self.progress_log.len() > PROGRESS_LOG_LIMIT {
            let excess = self.progress_log.len() - PROGRESS_LOG_LIMIT;
            self.progress_log.drain(..excess);
        }

        if let Some(style) = &delta.learning_style {
            self.learning_style = Some(style.clone());
        }
        if let Some(summary) = &delta.last_interaction_summary {
            self.last_interaction_summary = Some(summary.clone());
        }
    }
}

/// Partial profile update, usually parsed from model JSON output.
///
/// Deserialization is lenient: every field is optional, `progress_log`
/// accepts a bare string, and the two maps treat `null`, arrays and other
/// non-objects as empty. Map entries whose value is not a number are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDelta {
    #[serde(deserialize_with = "lenient_map")]
    pub knowledge_areas: BTreeMap<String, f64>,
    #[serde(deserialize_with = "lenient_map")]
    pub misconceptions: BTreeMap<String, f64>,
    #[serde(deserialize_with = "one_or_many")]
    pub progress_log: Vec<String>,
    pub learning_style: Option<String>,
    pub last_interaction_summary: Option<String>,
}

impl ProfileDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry<T> {
        Value(T),
        Other(IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrOther<T> {
        Map(BTreeMap<String, Entry<T>>),
        Other(IgnoredAny),
    }

    Ok(match MapOrOther::<T>::deserialize(deserializer)? {
        MapOrOther::Map(entries) => entries
            .into_iter()
            .filter_map(|(key, entry)| match entry {
                Entry::Value(value) => Some((key, value)),
                Entry::Other(_) => None,
            })
            .collect(),
        MapOrOther::Other(_) => BTreeMap::new(),
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

// =============================================================================
// CHAT MESSAGES + SESSIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Which agent produced an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Questioning,
    StudentModel,
    Feedback,
    Safety,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub agent_type: Option<AgentType>,
    pub session_id: Uuid,
}

/// Message fields supplied by the caller; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub content: String,
    pub role: Role,
    pub agent_type: Option<AgentType>,
}

impl NewMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { content: content.into(), role: Role::User, agent_type: None }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, agent_type: AgentType) -> Self {
        Self { content: content.into(), role: Role::Assistant, agent_type: Some(agent_type) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
    pub student_profile: StudentProfile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
}

/// Mutable session fields. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub student_profile: Option<StudentProfile>,
}

// =============================================================================
// AGENT STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyVerdict {
    #[default]
    Clean,
    Flagged,
}

/// Label each step leaves behind for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    #[default]
    Start,
    EvaluateFeedback,
    CheckSafety,
    RespondToStudent,
    ReQuestion,
    AwaitStudentResponse,
}

/// Per-request state threaded through the agent chain.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    pub user_id: String,
    pub session_id: Uuid,
    pub current_message: String,
    pub chat_history: Vec<ChatMessage>,
    pub student_profile: StudentProfile,
    pub current_question: String,
    pub student_response: String,
    pub feedback: String,
    pub safety_check_result: SafetyVerdict,
    pub next_action: NextAction,
}

impl AgentState {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        session_id: Uuid,
        message: impl Into<String>,
        chat_history: Vec<ChatMessage>,
        student_profile: StudentProfile,
    ) -> Self {
        let message = message.into();
        Self {
            user_id: user_id.into(),
            session_id,
            current_message: message.clone(),
            chat_history,
            student_profile,
            current_question: String::new(),
            student_response: message,
            feedback: String::new(),
            safety_check_result: SafetyVerdict::Clean,
            next_action: NextAction::Start,
        }
    }

    /// Overlay the fields a step produced.
    pub fn apply(&mut self, update: AgentUpdate) {
        if let Some(profile) = update.student_profile {
            self.student_profile = profile;
        }
        if let Some(question) = update.current_question {
            self.current_question = question;
        }
        if let Some(feedback) = update.feedback {
            self.feedback = feedback;
        }
        if let Some(verdict) = update.safety_check_result {
            self.safety_check_result = verdict;
        }
        self.next_action = update.next_action;
    }
}

/// Partial result of one agent step.
#[derive(Debug, Clone)]
pub struct AgentUpdate {
    pub student_profile: Option<StudentProfile>,
    pub current_question: Option<String>,
    pub feedback: Option<String>,
    pub safety_check_result: Option<SafetyVerdict>,
    pub next_action: NextAction,
}

impl AgentUpdate {
    #[must_use]
    pub fn next(next_action: NextAction) -> Self {
        Self { student_profile: None, current_question: None, feedback: None, safety_check_result: None, next_action }
    }
}

// =============================================================================
// AGENT STATUS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentActivity {
    Active,
    Processing,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub questioning_agent: AgentActivity,
    pub student_model_agent: AgentActivity,
    pub feedback_agent: AgentActivity,
    pub safety_agent: AgentActivity,
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
