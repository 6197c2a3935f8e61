//! Text attachments appended to a question as extra context.
//! Plain text only (UTF-8); binary content is rejected.

use std::path::Path;
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// A loaded attachment, already capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub text: String,
    /// Whether the source was longer than the cap
    pub truncated: bool,
}

impl Attachment {
    /// Build from raw bytes. Invalid UTF-8 or NUL bytes mean binary content.
    pub fn from_bytes(name: &str, data: &[u8], max_chars: usize) -> Result<Self> {
        if data.contains(&0) {
            return Err(AppError::Validation(format!(
                "Binary files are not supported: {}",
                name
            )));
        }
        let raw = std::str::from_utf8(data).map_err(|e| {
            AppError::Validation(format!("Invalid UTF-8 content in {}: {}", name, e))
        })?;

        let (text, truncated) = cap_chars(raw, max_chars);
        if truncated {
            warn!("Attachment {} truncated to {} characters", name, max_chars);
        }
        Ok(Self {
            name: name.to_string(),
            text,
            truncated,
        })
    }

    /// Read an attachment from disk.
    pub fn load(path: &Path, max_chars: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let attachment = Self::from_bytes(&name, &data, max_chars)?;
        info!(
            "Attachment loaded: {} ({} chars)",
            attachment.name,
            attachment.char_count()
        );
        Ok(attachment)
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Keep at most `max_chars` characters.
fn cap_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (text[..cut].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Text that is classified and logged for a question with an optional attachment.
pub fn compose_user_text(question: &str, attachment: Option<&Attachment>) -> String {
    match attachment {
        Some(a) if !a.text.is_empty() => {
            format!("{}\n\n---\nAttached context:\n{}", question, a.text)
        }
        _ => question.to_string(),
    }
}
