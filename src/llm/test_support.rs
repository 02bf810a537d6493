//! Scriptable `LlmChat` used across agent, workflow and route tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::types::{ChatResponse, ContentBlock, LlmChat, LlmError, Message};

pub(crate) struct MockLlm {
    responses: Mutex<VecDeque<Result<String, u16>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Replies with each text in order, then `"done"` once exhausted.
    pub(crate) fn new(texts: &[&str]) -> Self {
        Self {
            responses: Mutex::new(texts.iter().map(|t| Ok((*t).to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with the given HTTP status.
    pub(crate) fn failing(status: u16) -> Self {
        Self { responses: Mutex::new(std::iter::repeat_n(Err(status), 16).collect()), prompts: Mutex::new(Vec::new()) }
    }

    /// Prompts seen so far (content of the last user message per call).
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmChat for MockLlm {
    async fn chat(&self, _max_tokens: u32, _system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        if let Some(last) = messages.last() {
            self.prompts.lock().unwrap().push(last.content.clone());
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next.unwrap_or_else(|| Ok("done".into())) {
            Ok(text) => Ok(ChatResponse {
                content: vec![ContentBlock::Text { text }],
                model: "mock".into(),
                stop_reason: "end_turn".into(),
                input_tokens: 0,
                output_tokens: 0,
            }),
            Err(status) => Err(LlmError::ApiResponse { status, body: "mock failure".into() }),
        }
    }
}
