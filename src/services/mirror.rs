//! Best-effort document mirror for profiles and sessions.
//!
//! DESIGN
//! ======
//! The in-memory store is authoritative. After each turn the route layer
//! hands the new profile and session to this mirror, which upserts them as
//! JSONB documents keyed by `(collection, id)`. Upserts shallow-merge into
//! the existing document (`body || excluded.body`).
//!
//! ERROR HANDLING
//! ==============
//! Every failure is logged and swallowed. A mirror without a pool is a
//! no-op, which is how the server runs when `DATABASE_URL` is unset or the
//! database was unreachable at startup.

use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::models::{ChatSession, StudentProfile};

pub const PROFILES_COLLECTION: &str = "student_profiles";
pub const SESSIONS_COLLECTION: &str = "chat_sessions";

#[derive(Clone, Default)]
pub struct DocumentMirror {
    pool: Option<PgPool>,
}

impl DocumentMirror {
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Some(pool) }
    }

    /// Connect and migrate when `DATABASE_URL` is configured. Connection
    /// failures disable the mirror rather than aborting startup.
    pub async fn connect(config: &AppConfig) -> Self {
        let Some(url) = config.database_url.as_deref() else {
            info!("document mirror not configured; using in-memory storage only");
            return Self::disabled();
        };
        match crate::db::init_pool(url, config.db_max_connections).await {
            Ok(pool) => {
                info!(max_connections = config.db_max_connections, "document mirror connected");
                Self::new(pool)
            }
            Err(e) => {
                error!(error = %e, "document mirror unavailable; continuing without it");
                Self::disabled()
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn save_student_profile(&self, user_id: &str, profile: &StudentProfile) {
        if let Err(e) = self.upsert(PROFILES_COLLECTION, user_id, profile).await {
            warn!(%user_id, error = %e, "mirror: saving student profile failed");
        }
    }

    pub async fn save_session(&self, session: &ChatSession) {
        let id = session.id.to_string();
        if let Err(e) = self.upsert(SESSIONS_COLLECTION, &id, session).await {
            warn!(session_id = %session.id, error = %e, "mirror: saving session failed");
        }
    }

    /// Mirrored profile for `user_id`, if the mirror has one and it parses.
    pub async fn get_student_profile(&self, user_id: &str) -> Option<StudentProfile> {
        let pool = self.pool.as_ref()?;
        let row = sqlx::query_scalar::<_, Json<StudentProfile>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(PROFILES_COLLECTION)
        .bind(user_id)
        .fetch_optional(pool)
        .await;

        match row {
            Ok(found) => found.map(|Json(profile)| profile),
            Err(e) => {
                warn!(%user_id, error = %e, "mirror: loading student profile failed");
                None
            }
        }
    }

    async fn upsert<T: Serialize + Sync>(&self, collection: &str, id: &str, body: &T) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };
        sqlx::query(
            "INSERT INTO documents (collection, id, body, updated_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (collection, id)
             DO UPDATE SET body = documents.body || EXCLUDED.body, updated_at = now()",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(body))
        .execute(pool)
        .await?;
        debug!(collection, id, "mirror: document saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "mirror_test.rs"]
mod tests;
