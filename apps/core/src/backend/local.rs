use async_trait::async_trait;
use std::sync::Arc;

use super::{ChatBackend, ChatReply, ChatRequest};
use crate::brain::FaqAssistant;
use crate::config::ChatMode;
use crate::error::Result;

/// In-process backend: rules, retrieval and the fallback pool.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    assistant: Arc<FaqAssistant>,
}

impl LocalBackend {
    pub fn new(assistant: Arc<FaqAssistant>) -> Self {
        Self { assistant }
    }

    pub fn assistant(&self) -> &FaqAssistant {
        &self.assistant
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    async fn reply(&self, request: &ChatRequest) -> Result<ChatReply> {
        let answer = self
            .assistant
            .answer_in(&request.text, request.detected_language, request.preference);
        let c = answer.classification;
        Ok(ChatReply {
            text: answer.reply,
            tag: c.tag,
            source: c.source.to_string(),
            confidence: c.confidence,
            lang: c.response_language.to_string(),
            analytics: None,
        })
    }

    fn mode(&self) -> ChatMode {
        ChatMode::Local
    }
}
