//! Classification output types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::language::Language;
use crate::error::AppError;

/// Which stage of the pipeline produced the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Rule,
    Retrieval,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Rule => "rule",
            Source::Retrieval => "retrieval",
            Source::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(Source::Rule),
            "retrieval" => Ok(Source::Retrieval),
            "fallback" => Ok(Source::Fallback),
            other => Err(AppError::Validation(format!("Unknown source: {}", other))),
        }
    }
}

/// Result of classifying one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub tag: String,
    pub source: Source,
    /// 1.0 for rules, the Jaccard score for retrieval, 0.0 for fallback
    pub confidence: f32,
    /// Script of the input, used for matching
    pub detected_language: Language,
    /// Language the reply should be written in
    pub response_language: Language,
    /// Name of the rule that fired, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
}

/// A classification together with the reply text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub classification: Classification,
    pub reply: String,
}
