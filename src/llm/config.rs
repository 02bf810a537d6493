//! LLM configuration parsed from environment variables.

use super::types::LlmError;
use crate::config::env_parse;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Credentials and model for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// `None` when `GEMINI_API_KEY` is unset or blank.
    pub gemini: Option<ProviderConfig>,
    /// `None` when `ANTHROPIC_API_KEY` is unset or blank.
    pub anthropic: Option<ProviderConfig>,
    pub gemini_base_url: String,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Optional:
    /// - `GEMINI_API_KEY`, `GEMINI_MODEL` (default `gemini-2.5-flash`)
    /// - `GEMINI_BASE_URL`: default Generative Language API base URL
    /// - `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL` (default `claude-sonnet-4-20250514`)
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigParse`] if `GEMINI_BASE_URL` is not an http(s) URL.
    pub fn from_env() -> Result<Self, LlmError> {
        let gemini = provider_from_env("GEMINI_API_KEY", "GEMINI_MODEL", DEFAULT_GEMINI_MODEL);
        let anthropic = provider_from_env("ANTHROPIC_API_KEY", "ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL);

        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !gemini_base_url.starts_with("http://") && !gemini_base_url.starts_with("https://") {
            return Err(LlmError::ConfigParse(format!("GEMINI_BASE_URL must be an http(s) URL: {gemini_base_url}")));
        }

        let timeouts = LlmTimeouts {
            request_secs: env_parse("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { gemini, anthropic, gemini_base_url, timeouts })
    }
}

fn provider_from_env(key_var: &str, model_var: &str, default_model: &str) -> Option<ProviderConfig> {
    let api_key = std::env::var(key_var).ok().filter(|k| !k.trim().is_empty())?;
    let model = std::env::var(model_var)
        .ok()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_model.to_string());
    Some(ProviderConfig { api_key, model })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
