//! In-memory session, transcript and profile store.
//!
//! DESIGN
//! ======
//! Three maps behind one `tokio::sync::RwLock`: sessions by id, transcripts
//! by session id, profiles by user id. Sessions are stored without their
//! messages; reads stitch the transcript back on. Nothing is evicted and
//! nothing survives a restart; the document mirror is the only secondary
//! copy.
//!
//! The lock is never held across an await on anything but itself, so LLM
//! calls in the agent chain never block other requests.

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatSession, NewMessage, ProfileDelta, SessionUpdate, StudentProfile};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, ChatSession>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
    profiles: HashMap<String, StudentProfile>,
}

impl StoreInner {
    fn profile_or_create(&mut self, user_id: &str) -> &mut StudentProfile {
        self.profiles
            .entry(user_id.to_string())
            .or_insert_with(|| StudentProfile::new(user_id))
    }

    fn with_messages(&self, session: &ChatSession) -> ChatSession {
        let mut out = session.clone();
        out.messages = self.messages.get(&session.id).cloned().unwrap_or_default();
        out
    }
}

/// Cheap to clone; all clones share the same maps.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Open a new session for `user_id`, snapshotting (and creating if
    /// needed) the user's profile.
    pub async fn create_session(&self, user_id: &str) -> ChatSession {
        let mut inner = self.inner.write().await;
        let profile = inner.profile_or_create(user_id).clone();
        let now = OffsetDateTime::now_utc();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            messages: Vec::new(),
            student_profile: profile,
            created_at: now,
            updated_at: now,
            is_active: true,
        };
        inner.sessions.insert(session.id, session.clone());
        inner.messages.insert(session.id, Vec::new());
        session
    }

    /// Session with its transcript attached.
    pub async fn get_session(&self, session_id: Uuid) -> Option<ChatSession> {
        let inner = self.inner.read().await;
        inner
            .sessions
            .get(&session_id)
            .map(|s| inner.with_messages(s))
    }

    /// Apply `update` and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SessionNotFound`] for an unknown id.
    pub async fn update_session(&self, session_id: Uuid, update: SessionUpdate) -> Result<ChatSession, StoreError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        if let Some(profile) = update.student_profile {
            session.student_profile = profile;
        }
        session.updated_at = OffsetDateTime::now_utc();
        let session = session.clone();
        Ok(inner.with_messages(&session))
    }

    /// All sessions owned by `user_id`, oldest first, transcripts attached.
    pub async fn sessions_by_user(&self, user_id: &str) -> Vec<ChatSession> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<ChatSession> = inner
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .map(|s| inner.with_messages(s))
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        sessions
    }

    // =========================================================================
    // MESSAGES
    // =========================================================================

    /// Append a message to a session transcript and bump the session's
    /// `updated_at`. Earlier messages are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SessionNotFound`] for an unknown id.
    pub async fn add_message(&self, session_id: Uuid, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let mut inner = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let session = inner
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        session.updated_at = now;

        let message = ChatMessage {
            id: Uuid::new_v4(),
            content: message.content,
            role: message.role,
            timestamp: now,
            agent_type: message.agent_type,
            session_id,
        };
        inner
            .messages
            .entry(session_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    /// Transcript for a session; empty for unknown ids.
    pub async fn messages(&self, session_id: Uuid) -> Vec<ChatMessage> {
        let inner = self.inner.read().await;
        inner.messages.get(&session_id).cloned().unwrap_or_default()
    }

    // =========================================================================
    // PROFILES
    // =========================================================================

    /// Profile for `user_id`, created empty on first lookup.
    pub async fn student_profile(&self, user_id: &str) -> StudentProfile {
        let mut inner = self.inner.write().await;
        inner.profile_or_create(user_id).clone()
    }

    pub async fn has_profile(&self, user_id: &str) -> bool {
        self.inner.read().await.profiles.contains_key(user_id)
    }

    /// Install a profile restored from elsewhere. A profile already in
    /// memory wins; returns whether `profile` was inserted.
    pub async fn seed_profile(&self, profile: StudentProfile) -> bool {
        let mut inner = self.inner.write().await;
        if inner.profiles.contains_key(&profile.user_id) {
            return false;
        }
        inner
            .profiles
            .insert(profile.user_id.clone(), profile);
        true
    }

    /// Merge `delta` into the user's profile and return the result.
    pub async fn update_student_profile(&self, user_id: &str, delta: &ProfileDelta) -> StudentProfile {
        let mut inner = self.inner.write().await;
        let profile = inner.profile_or_create(user_id);
        profile.merge(delta);
        profile.clone()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
