//! Token-overlap retrieval over the intent index.
//!
//! Jaccard similarity between the query's token set and each example phrase.
//! The best entry wins; on ties the earliest entry in dataset order is kept.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::index::IntentIndex;
use super::language::Language;
use super::tokenizer::token_set;

/// Minimum similarity for a retrieval match to be accepted.
pub const DEFAULT_RETRIEVAL_THRESHOLD: f32 = 0.25;

/// Best-scoring index entry for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// None when the query has no content tokens or overlaps no entry
    pub tag: Option<String>,
    /// In [0, 1]
    pub score: f32,
}

impl MatchResult {
    fn none() -> Self {
        Self {
            tag: None,
            score: 0.0,
        }
    }
}

/// |A ∩ B| / |A ∪ B|, or 0 when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Whether a retrieval score clears the threshold (inclusive).
pub fn is_accepted(score: f32, threshold: f32) -> bool {
    score >= threshold
}

/// Score `text` against every entry of `lang` and return the best.
///
/// Only a strictly greater score replaces the current best, starting from 0,
/// so a query with no overlap has no tag.
pub fn retrieve(text: &str, index: &IntentIndex, lang: Language) -> MatchResult {
    let query = token_set(text, lang);
    if query.is_empty() {
        return MatchResult::none();
    }

    let mut best = MatchResult::none();
    for entry in index.entries(lang) {
        let score = jaccard(&query, &entry.tokens);
        if score > best.score {
            best = MatchResult {
                tag: Some(entry.tag.clone()),
                score,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::dataset::Dataset;
    use serde_json::json;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn index() -> IntentIndex {
        let dataset = Dataset::from_value(&json!({"intents": [
            {"tag": "exam_schedule", "patterns": {
                "en": ["when is the final exam schedule", "exam timetable"],
                "ar": ["متى جدول الامتحانات النهائية"]}},
            {"tag": "gpa_calculation", "patterns": {
                "en": ["how is gpa calculated"],
                "ar": ["كيف يحسب المعدل التراكمي"]}},
            {"tag": "timetable_copy", "patterns": {"en": ["exam timetable"]}}
        ]}));
        IntentIndex::build(&dataset)
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["a", "b"])), 1.0);
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["c"])), 0.0);
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0);
        assert_eq!(jaccard(&set(&[]), &set(&["a"])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_best_match_wins() {
        let result = retrieve("How is my GPA calculated?", &index(), Language::English);
        assert_eq!(result.tag.as_deref(), Some("gpa_calculation"));
        // {how, my, gpa, calculated} vs {how, gpa, calculated}
        assert_eq!(result.score, 0.75);
    }

    #[test]
    fn test_tie_keeps_earliest_entry() {
        let result = retrieve("exam timetable", &index(), Language::English);
        assert_eq!(result.tag.as_deref(), Some("exam_schedule"));
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_zero_overlap_has_no_tag() {
        let result = retrieve("parking permit", &index(), Language::English);
        assert_eq!(result, MatchResult { tag: None, score: 0.0 });
    }

    #[test]
    fn test_empty_query_has_no_tag() {
        assert_eq!(retrieve("", &index(), Language::English).tag, None);
        assert_eq!(retrieve("the and of", &index(), Language::English).tag, None);
    }

    #[test]
    fn test_empty_index_has_no_tag() {
        let empty = IntentIndex::default();
        let result = retrieve("exam", &empty, Language::English);
        assert_eq!(result, MatchResult { tag: None, score: 0.0 });
    }

    #[test]
    fn test_arabic_retrieval_uses_arabic_entries() {
        let result = retrieve("كيف يحسب المعدل", &index(), Language::Arabic);
        assert_eq!(result.tag.as_deref(), Some("gpa_calculation"));
        assert_eq!(result.score, 0.75);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_accepted(0.25, DEFAULT_RETRIEVAL_THRESHOLD));
        assert!(!is_accepted(0.249_999, DEFAULT_RETRIEVAL_THRESHOLD));
        assert!(is_accepted(1.0, DEFAULT_RETRIEVAL_THRESHOLD));
    }
}
