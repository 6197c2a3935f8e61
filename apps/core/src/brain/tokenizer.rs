//! Content-token extraction.
//!
//! Text is normalized first, split on anything that is neither an ASCII word
//! character nor inside the Arabic blocks, then filtered through a small fixed
//! stopword list per language.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::language::Language;
use super::normalize::normalize;

/// Stopwords for English
const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "is", "are",
];

/// Stopwords for Arabic
const STOPWORDS_AR: &[&str] = &[
    "في", "على", "من", "الى", "إلى", "عن", "هذا", "هذه", "ذلك", "تلك", "و", "يا", "هل",
];

// Tokens are compared after normalization, so the lists are normalized the
// same way ("على" is matched as "علي", "إلى" as "الي").
static STOPWORD_SET_EN: LazyLock<HashSet<String>> =
    LazyLock::new(|| build_stopword_set(STOPWORDS_EN, Language::English));
static STOPWORD_SET_AR: LazyLock<HashSet<String>> =
    LazyLock::new(|| build_stopword_set(STOPWORDS_AR, Language::Arabic));

// NOTE: expect() on a literal pattern; failure would be a programming error.
static TOKEN_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_\x{0600}-\x{06FF}\x{0750}-\x{077F}\x{08A0}-\x{08FF}]+")
        .expect("Invalid regex: token separator")
});

fn build_stopword_set(words: &[&str], lang: Language) -> HashSet<String> {
    words.iter().map(|w| normalize(w, lang)).collect()
}

/// Stopword set for a language
pub fn stopwords(lang: Language) -> &'static HashSet<String> {
    match lang {
        Language::English => &STOPWORD_SET_EN,
        Language::Arabic => &STOPWORD_SET_AR,
    }
}

/// Split text into content tokens, in order of appearance (duplicates kept).
pub fn tokenize(text: &str, lang: Language) -> Vec<String> {
    let normalized = normalize(text, lang);
    if normalized.is_empty() {
        return Vec::new();
    }

    let stop = stopwords(lang);
    TOKEN_SEPARATOR
        .split(&normalized)
        .filter(|part| !part.is_empty() && !stop.contains(*part))
        .map(str::to_string)
        .collect()
}

/// Tokenize and collect into a set, the form used for similarity scoring.
pub fn token_set(text: &str, lang: Language) -> HashSet<String> {
    tokenize(text, lang).into_iter().collect()
}
