//! Language detection by script presence.
//!
//! The assistant is bilingual: any character from the Arabic Unicode blocks
//! makes the input Arabic, everything else is treated as English.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    /// Both languages, in index order (English first).
    pub const ALL: [Language; 2] = [Language::English, Language::Arabic];

    /// Returns the language code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ar" | "arabic" => Ok(Language::Arabic),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Reply language chosen in the UI.
///
/// `Auto` answers in the detected language of each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    #[default]
    Auto,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl LanguagePreference {
    /// Language the reply should be written in, given the detected input language.
    pub fn response_language(&self, detected: Language) -> Language {
        match self {
            LanguagePreference::Auto => detected,
            LanguagePreference::English => Language::English,
            LanguagePreference::Arabic => Language::Arabic,
        }
    }
}

impl FromStr for LanguagePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LanguagePreference::Auto),
            "en" | "english" => Ok(LanguagePreference::English),
            "ar" | "arabic" => Ok(LanguagePreference::Arabic),
            other => Err(format!("unsupported language preference '{}'", other)),
        }
    }
}

/// Arabic (U+0600–U+06FF), Arabic Supplement (U+0750–U+077F) and
/// Arabic Extended-A (U+08A0–U+08FF).
pub fn is_arabic_char(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{08A0}'..='\u{08FF}')
}

/// Classify raw input as Arabic or English.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(is_arabic_char) {
        Language::Arabic
    } else {
        Language::English
    }
}
