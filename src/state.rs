//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the in-memory store, the LLM providers and the document mirror.
//! Every field is cheap to clone.

use std::sync::Arc;

use crate::llm::LlmService;
use crate::services::mirror::DocumentMirror;
use crate::store::MemStore;

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: MemStore,
    pub llm: Arc<LlmService>,
    pub mirror: DocumentMirror,
    /// Deployment label reported by `/health`.
    pub environment: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(llm: LlmService, mirror: DocumentMirror, environment: &str) -> Self {
        Self { store: MemStore::new(), llm: Arc::new(llm), mirror, environment: Arc::from(environment) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
