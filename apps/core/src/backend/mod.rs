//! Answer backends.
//!
//! A session asks one backend per turn: the in-process [`LocalBackend`] or the
//! remote [`ApiClient`]. Both sit behind [`ChatBackend`] so either can be
//! swapped (or mocked) without touching the session.

pub mod api;
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::brain::language::{detect_language, Language, LanguagePreference};
use crate::config::ChatMode;
use crate::error::Result;

pub use api::{health_url_from_chat_url, ApiClient, ApiSettings, HealthStatus};
pub use local::LocalBackend;

/// One question for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Full text to classify (question plus any attachment)
    pub text: String,
    /// Language of the question; `text` is matched as this language
    pub detected_language: Language,
    pub preference: LanguagePreference,
    pub user_name: String,
}

impl ChatRequest {
    /// Detects the language on `text` itself.
    pub fn new(
        text: impl Into<String>,
        preference: LanguagePreference,
        user_name: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            detected_language: detect_language(&text),
            text,
            preference,
            user_name: user_name.into(),
        }
    }

    /// Override the detected language, e.g. with the one of the bare question
    /// when `text` carries an attachment.
    pub fn with_detected_language(mut self, lang: Language) -> Self {
        self.detected_language = lang;
        self
    }

    /// Language the reply should be in.
    pub fn response_language(&self) -> Language {
        self.preference.response_language(self.detected_language)
    }
}

/// A backend's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub tag: String,
    /// `rule`, `retrieval`, `fallback` locally; anything the API reports remotely
    pub source: String,
    pub confidence: f32,
    /// Language code of the reply
    pub lang: String,
    /// Extra data returned by the remote API (sentiment, entities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Value>,
}

impl ChatReply {
    /// One-line diagnostic summary: `source • tag • confidence [• analytics]`.
    pub fn meta_line(&self) -> String {
        let mut meta = format!("{} • {} • {:.2}", self.source, self.tag, self.confidence);
        if let Some(analytics) = &self.analytics {
            if let Some(label) = analytics
                .get("sentiment")
                .and_then(|s| s.get("label"))
                .and_then(Value::as_str)
            {
                meta.push_str(&format!(" • {} sentiment", label));
            }
            if let Some(entities) = analytics.get("entities").and_then(Value::as_array) {
                if !entities.is_empty() {
                    meta.push_str(&format!(" • {} entities", entities.len()));
                }
            }
        }
        meta
    }
}

/// Defines the interface of an answer backend.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// Produce a reply for one request.
    async fn reply(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Mode recorded in the transcript for replies from this backend.
    fn mode(&self) -> ChatMode;
}
