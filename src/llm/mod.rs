//! Gemini and Anthropic adapters behind one tutoring-facing service.
//!
//! DESIGN
//! ======
//! Each vendor client implements [`LlmChat`]. [`LlmService`] holds whichever
//! clients are configured and exposes the two calls the agents need:
//! free-text generation (Gemini) and structured profile analysis (Anthropic
//! first, Gemini second). Missing API keys leave a provider slot empty
//! instead of failing startup.

pub mod anthropic;
pub mod config;
pub mod gemini;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::ProfileDelta;
use config::LlmConfig;
pub use types::LlmChat;
use types::{LlmError, Message};

/// Anthropic requires an output cap; Gemini requests carry none.
const MAX_OUTPUT_TOKENS: u32 = 1000;
const GEMINI_JSON_SUFFIX: &str = "\n\nProvide your response as a valid JSON object only.";

// =============================================================================
// SERVICE
// =============================================================================

/// Provider dispatch for the tutoring agents.
pub struct LlmService {
    gemini: Option<Arc<dyn LlmChat>>,
    anthropic: Option<Arc<dyn LlmChat>>,
}

impl LlmService {
    #[must_use]
    pub fn new(gemini: Option<Arc<dyn LlmChat>>, anthropic: Option<Arc<dyn LlmChat>>) -> Self {
        Self { gemini, anthropic }
    }

    /// No providers: every agent step takes its fallback path.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    /// Build vendor clients for every provider with a key.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let gemini: Option<Arc<dyn LlmChat>> = match config.gemini {
            Some(p) => {
                let client = gemini::GeminiClient::new(p.api_key, p.model, config.gemini_base_url, config.timeouts)?;
                info!(model = client.model(), "gemini client initialized");
                Some(Arc::new(client))
            }
            None => None,
        };
        let anthropic: Option<Arc<dyn LlmChat>> = match config.anthropic {
            Some(p) => {
                let client = anthropic::AnthropicClient::new(p.api_key, p.model, config.timeouts)?;
                info!(model = client.model(), "anthropic client initialized");
                Some(Arc::new(client))
            }
            None => None,
        };
        Ok(Self::new(gemini, anthropic))
    }

    /// Names of the configured providers, for startup logging.
    #[must_use]
    pub fn providers(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.gemini.is_some() {
            out.push("gemini");
        }
        if self.anthropic.is_some() {
            out.push("anthropic");
        }
        out
    }

    /// Single-turn Gemini generation.
    ///
    /// # Errors
    ///
    /// Fails when Gemini is not configured, the call fails, or no text came back.
    pub async fn call_gemini(&self, prompt: &str) -> Result<String, LlmError> {
        let client = self.gemini.as_ref().ok_or(LlmError::NotConfigured("gemini"))?;
        let response = client.chat(MAX_OUTPUT_TOKENS, "", &[Message::user(prompt)]).await?;
        debug!(
            model = %response.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "gemini: response"
        );
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(LlmError::EmptyResponse("gemini"))
    }

    /// Ask for profile deltas as JSON. Anthropic first, Gemini on failure.
    ///
    /// Unparseable output and a double provider failure both resolve to
    /// canned deltas, so this only errors when no provider is configured.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NotConfigured`] when neither provider has a key.
    pub async fn analyze_student_response(&self, prompt: &str) -> Result<ProfileDelta, LlmError> {
        if self.anthropic.is_none() && self.gemini.is_none() {
            return Err(LlmError::NotConfigured("anthropic or gemini"));
        }

        if let Some(client) = &self.anthropic {
            match client
                .chat(MAX_OUTPUT_TOKENS, "", &[Message::user(prompt)])
                .await
            {
                Ok(response) => {
                    let text = response.text().unwrap_or_else(|| "{}".into());
                    return Ok(parse_profile_delta(&text).unwrap_or_else(|| {
                        warn!("analysis: anthropic output was not a profile object");
                        unclear_analysis_delta()
                    }));
                }
                Err(e) => {
                    warn!(error = %e, retryable = e.retryable(), "analysis: anthropic failed, falling back to gemini");
                }
            }
        }

        let gemini_prompt = format!("{prompt}{GEMINI_JSON_SUFFIX}");
        match self.call_gemini(&gemini_prompt).await {
            Ok(text) => Ok(parse_profile_delta(&text).unwrap_or_else(|| {
                warn!("analysis: gemini output was not a profile object");
                gemini_fallback_delta()
            })),
            Err(e) => {
                warn!(error = %e, "analysis: all providers failed");
                Ok(failed_analysis_delta())
            }
        }
    }
}

// =============================================================================
// PROFILE DELTA PARSING
// =============================================================================

/// Parse a profile delta from model output, tolerating Markdown code fences
/// and prose around the JSON object.
pub(crate) fn parse_profile_delta(text: &str) -> Option<ProfileDelta> {
    let trimmed = text.trim();
    if let Ok(delta) = serde_json::from_str::<ProfileDelta>(trimmed) {
        return Some(delta);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<ProfileDelta>(&trimmed[start..=end]).ok()
}

fn unclear_analysis_delta() -> ProfileDelta {
    ProfileDelta {
        progress_log: vec!["Could not parse detailed analysis".into()],
        last_interaction_summary: Some("Analysis completed but format was unclear".into()),
        ..ProfileDelta::default()
    }
}

fn gemini_fallback_delta() -> ProfileDelta {
    ProfileDelta {
        knowledge_areas: BTreeMap::from([("general".to_string(), 0.5)]),
        progress_log: vec!["Processed response with Gemini fallback".into()],
        last_interaction_summary: Some("Student engaged with learning content".into()),
        ..ProfileDelta::default()
    }
}

fn failed_analysis_delta() -> ProfileDelta {
    ProfileDelta {
        progress_log: vec!["Error during analysis".into()],
        last_interaction_summary: Some("Analysis failed due to technical error".into()),
        ..ProfileDelta::default()
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
