//! Intent index: token sets of every example phrase, per language.
//!
//! A flat list scanned linearly. The corpus is tens to low hundreds of phrases;
//! a much larger corpus would want an inverted token -> entries map with the
//! same ranking (Jaccard, best score wins, earliest entry on ties).

use std::collections::HashSet;

use super::dataset::Dataset;
use super::language::Language;
use super::tokenizer::token_set;

/// One tokenized example phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub tag: String,
    /// Never empty
    pub tokens: HashSet<String>,
}

/// Index entries for both languages, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct IntentIndex {
    en: Vec<IndexEntry>,
    ar: Vec<IndexEntry>,
}

impl IntentIndex {
    /// Tokenize every example phrase; phrases with no content tokens are dropped.
    pub fn build(dataset: &Dataset) -> Self {
        let mut index = Self::default();
        for intent in dataset.intents() {
            for lang in Language::ALL {
                for phrase in intent.patterns.get(lang) {
                    let tokens = token_set(phrase, lang);
                    if tokens.is_empty() {
                        continue;
                    }
                    index.entries_mut(lang).push(IndexEntry {
                        tag: intent.tag.clone(),
                        tokens,
                    });
                }
            }
        }
        index
    }

    /// Entries for a language, in scan order
    pub fn entries(&self, lang: Language) -> &[IndexEntry] {
        match lang {
            Language::English => &self.en,
            Language::Arabic => &self.ar,
        }
    }

    fn entries_mut(&mut self, lang: Language) -> &mut Vec<IndexEntry> {
        match lang {
            Language::English => &mut self.en,
            Language::Arabic => &mut self.ar,
        }
    }

    /// Total number of entries across languages
    pub fn len(&self) -> usize {
        self.en.len() + self.ar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_drops_empty_tokenizations() {
        let dataset = Dataset::from_value(&json!({"intents": [
            {"tag": "gpa", "patterns": {"en": ["How is GPA calculated", "the a an", ""], "ar": ["كيف يحسب المعدل"]}},
            {"tag": "fallback", "patterns": {"en": [], "ar": ["هل"]}}
        ]}));
        let index = IntentIndex::build(&dataset);
        assert_eq!(index.entries(Language::English).len(), 1);
        assert_eq!(index.entries(Language::Arabic).len(), 1);
        assert_eq!(index.len(), 2);
        for lang in Language::ALL {
            assert!(index.entries(lang).iter().all(|e| !e.tokens.is_empty()));
        }
    }

    #[test]
    fn test_entries_keep_dataset_order() {
        let dataset = Dataset::from_value(&json!({"intents": [
            {"tag": "first", "patterns": {"en": ["alpha", "beta"]}},
            {"tag": "second", "patterns": {"en": ["gamma"]}}
        ]}));
        let index = IntentIndex::build(&dataset);
        let tags: Vec<&str> = index
            .entries(Language::English)
            .iter()
            .map(|e| e.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["first", "first", "second"]);
    }
}
