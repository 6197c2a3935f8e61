//! Chat session: one user's conversation, end to end.
//!
//! Per turn the session:
//! 1. Appends a pending attachment to the question.
//! 2. Asks the backend for the current mode (local or remote API).
//! 3. Records the exchange in the transcript.
//! 4. Returns the reply with quick-reply suggestions.
//!
//! Offline replies (no dataset in local mode) and API failures are shown to the
//! user but never logged.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::attachment::{compose_user_text, Attachment};
use crate::backend::{ChatBackend, ChatReply, ChatRequest};
use crate::brain::dataset::FALLBACK_TAG;
use crate::brain::language::{detect_language, Language, LanguagePreference};
use crate::brain::suggestions::suggestions_for;
use crate::config::ChatMode;
use crate::dashboard::{DashboardFilter, DashboardReport};
use crate::error::{AppError, Result};
use crate::transcript::{now_ts, CsvLayout, Feedback, TranscriptStore, Turn, DEFAULT_USER_NAME};

/// Who is asking. Stored with every logged turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub program: String,
    pub level: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_USER_NAME.to_string(),
            program: String::new(),
            level: String::new(),
        }
    }
}

/// How a turn was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Answered by a backend and logged
    Answered,
    /// Local mode without a dataset
    Offline,
    /// The remote API failed
    ApiError,
}

/// What the user sees for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReply {
    pub id: String,
    pub ts: String,
    pub kind: ReplyKind,
    pub text: String,
    /// Diagnostic line (`source • tag • confidence`, `offline`, `api error`)
    pub meta: String,
    pub suggestions: Vec<&'static str>,
    pub response_language: Language,
    /// Backend reply, when there was one
    pub reply: Option<ChatReply>,
}

fn offline_message(lang: Language) -> &'static str {
    match lang {
        Language::English => {
            "I can't load the dataset right now. Start a local server and try again."
        }
        Language::Arabic => "لا يمكنني تحميل البيانات حالياً. شغّل خادماً محلياً ثم أعد المحاولة.",
    }
}

fn api_error_message(lang: Language, err: &AppError) -> String {
    match lang {
        Language::English => format!(
            "API request failed. Make sure the API server is running.\n{}",
            err
        ),
        Language::Arabic => format!("تعذر الاتصال بالـ API. تأكد من تشغيل الخادم.\n{}", err),
    }
}

#[derive(Debug, Clone)]
struct LastTurn {
    id: String,
    ts: String,
    bot_text: String,
}

/// A single user's chat session.
pub struct ChatSession {
    local: Option<Arc<dyn ChatBackend>>,
    remote: Option<Arc<dyn ChatBackend>>,
    transcript: Option<Arc<TranscriptStore>>,
    mode: ChatMode,
    preference: LanguagePreference,
    profile: UserProfile,
    attachment: Option<Attachment>,
    last_turn: Option<LastTurn>,
}

impl ChatSession {
    /// `local` is `None` when the dataset could not be loaded.
    pub fn new(
        local: Option<Arc<dyn ChatBackend>>,
        remote: Option<Arc<dyn ChatBackend>>,
        transcript: Option<Arc<TranscriptStore>>,
    ) -> Self {
        Self {
            local,
            remote,
            transcript,
            mode: ChatMode::Local,
            preference: LanguagePreference::Auto,
            profile: UserProfile::default(),
            attachment: None,
            last_turn: None,
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        info!("Session mode: {}", mode);
        self.mode = mode;
    }

    pub fn preference(&self) -> LanguagePreference {
        self.preference
    }

    pub fn set_preference(&mut self, preference: LanguagePreference) {
        self.preference = preference;
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Blank names fall back to `Guest`.
    pub fn set_user_name(&mut self, name: &str) {
        let name = name.trim();
        self.profile.name = if name.is_empty() {
            DEFAULT_USER_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    pub fn set_program(&mut self, program: &str) {
        self.profile.program = program.trim().to_string();
    }

    pub fn set_level(&mut self, level: &str) {
        self.profile.level = level.trim().to_string();
    }

    /// Attach text to the next question only.
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn transcript(&self) -> Option<&TranscriptStore> {
        self.transcript.as_deref()
    }

    fn backend(&self) -> Option<&Arc<dyn ChatBackend>> {
        match self.mode {
            ChatMode::Local => self.local.as_ref(),
            ChatMode::Api => self.remote.as_ref(),
        }
    }

    /// Answer one question. Blank input is ignored (`Ok(None)`).
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn ask(&mut self, question: &str) -> Result<Option<SessionReply>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }

        let ts = now_ts();
        let id = Uuid::new_v4().to_string();
        let detected = detect_language(question);
        let lang = self.preference.response_language(detected);
        let full_text = compose_user_text(question, self.attachment.take().as_ref());

        let Some(backend) = self.backend().cloned() else {
            let reply = match self.mode {
                ChatMode::Local => {
                    warn!("No dataset loaded; answering offline");
                    let text = offline_message(lang).to_string();
                    self.unlogged(id, ts, ReplyKind::Offline, text, "offline", lang)
                }
                ChatMode::Api => {
                    let err = AppError::Config("API mode is not configured".to_string());
                    let text = api_error_message(lang, &err);
                    self.unlogged(id, ts, ReplyKind::ApiError, text, "api error", lang)
                }
            };
            return Ok(Some(reply));
        };

        let request =
            ChatRequest::new(full_text.clone(), self.preference, self.profile.name.clone())
                .with_detected_language(detected);
        let reply = match backend.reply(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Backend failed: {}", e);
                let text = api_error_message(lang, &e);
                let reply = self.unlogged(id, ts, ReplyKind::ApiError, text, "api error", lang);
                return Ok(Some(reply));
            }
        };

        let turn = Turn {
            ts: ts.clone(),
            id: id.clone(),
            user_name: self.profile.name.clone(),
            user_text: full_text,
            bot_text: reply.text.clone(),
            tag: reply.tag.clone(),
            source: reply.source.clone(),
            lang: reply.lang.clone(),
            confidence: reply.confidence,
            mode: backend.mode(),
            program: self.profile.program.clone(),
            level: self.profile.level.clone(),
            feedback: Feedback::None,
        };
        if let Some(store) = &self.transcript {
            if let Err(e) = store.append(&turn) {
                error!("Failed to record turn {}: {}", id, e);
            }
        }
        info!(tag = %reply.tag, source = %reply.source, "Turn answered");

        self.last_turn = Some(LastTurn {
            id: id.clone(),
            ts: ts.clone(),
            bot_text: reply.text.clone(),
        });

        Ok(Some(SessionReply {
            id,
            ts,
            kind: ReplyKind::Answered,
            text: reply.text.clone(),
            meta: reply.meta_line(),
            suggestions: suggestions_for(&reply.tag, lang),
            response_language: lang,
            reply: Some(reply),
        }))
    }

    fn unlogged(
        &self,
        id: String,
        ts: String,
        kind: ReplyKind,
        text: String,
        meta: &str,
        response_language: Language,
    ) -> SessionReply {
        SessionReply {
            id,
            ts,
            kind,
            text,
            meta: meta.to_string(),
            suggestions: suggestions_for(FALLBACK_TAG, response_language),
            response_language,
            reply: None,
        }
    }

    /// Record feedback on the most recent logged reply.
    /// Returns `false` when there is nothing to attach it to.
    pub fn feedback(&self, feedback: Feedback) -> Result<bool> {
        let (Some(last), Some(store)) = (&self.last_turn, &self.transcript) else {
            return Ok(false);
        };
        store.set_feedback(&last.id, &last.ts, &last.bot_text, feedback)
    }

    /// Statistics over the whole transcript.
    pub fn dashboard(&self, filter: &DashboardFilter) -> Result<DashboardReport> {
        let turns = match &self.transcript {
            Some(store) => store.load()?,
            None => Vec::new(),
        };
        Ok(DashboardReport::build(&turns, filter))
    }

    /// Delete every logged turn. Feedback can no longer target the last reply.
    pub fn clear_transcript(&mut self) -> Result<()> {
        self.require_transcript()?.clear()?;
        self.last_turn = None;
        info!("Transcript cleared");
        Ok(())
    }

    pub fn export_json(&self, dest: &Path) -> Result<usize> {
        self.require_transcript()?.export_json(dest)
    }

    pub fn export_csv(&self, dest: &Path, layout: CsvLayout) -> Result<usize> {
        self.require_transcript()?.export_csv(dest, layout)
    }

    fn require_transcript(&self) -> Result<&TranscriptStore> {
        self.transcript
            .as_deref()
            .ok_or_else(|| AppError::Config("Transcript logging is disabled".to_string()))
    }
}
