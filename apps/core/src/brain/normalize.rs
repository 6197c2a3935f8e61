//! Per-language text normalization.
//!
//! English: whitespace collapsed, lowercased.
//! Arabic: diacritics and tatweel stripped, whitespace collapsed, letter variants
//! unified (hamza-bearing alef forms, alef maksura, hamza on waw/ya, ta marbuta).

use super::language::Language;

const TATWEEL: char = '\u{0640}';

/// Arabic harakat (U+064B–U+065F) and the superscript alef (U+0670).
fn is_arabic_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Map an Arabic letter variant to its canonical form.
fn canonical_arabic_letter(c: char) -> char {
    match c {
        'أ' | 'إ' | 'آ' => 'ا',
        'ى' => 'ي',
        'ؤ' => 'و',
        'ئ' => 'ي',
        'ة' => 'ه',
        other => other,
    }
}

/// Trim and collapse any whitespace run to a single space.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize English text: collapse whitespace, lowercase.
pub fn normalize_english(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Normalize Arabic text.
///
/// Marks are stripped before whitespace is collapsed so that a mark standing
/// alone between two spaces cannot leave a double space behind; this keeps the
/// function idempotent.
pub fn normalize_arabic(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|&c| c != TATWEEL && !is_arabic_diacritic(c))
        .map(canonical_arabic_letter)
        .collect();
    collapse_whitespace(&stripped)
}

/// Normalize text for the given language. Never fails; empty input gives "".
pub fn normalize(text: &str, lang: Language) -> String {
    match lang {
        Language::English => normalize_english(text),
        Language::Arabic => normalize_arabic(text),
    }
}
