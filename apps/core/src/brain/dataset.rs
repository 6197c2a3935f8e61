//! Intent dataset.
//!
//! The dataset is a JSON object `{ "intents": [ { tag, patterns: {en, ar},
//! responses: {en, ar} } ] }`. Decoding is lenient: missing or mistyped fields
//! become empty lists and never fail the load. Only invalid JSON syntax is an
//! error. Intent order is preserved because retrieval tie-breaking depends on it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::language::Language;
use crate::error::Result;

/// Tag of the distinguished intent that supplies the generic reply pool.
pub const FALLBACK_TAG: &str = "fallback";

/// A list of strings per language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedList {
    #[serde(default)]
    pub en: Vec<String>,
    #[serde(default)]
    pub ar: Vec<String>,
}

impl LocalizedList {
    pub fn get(&self, lang: Language) -> &[String] {
        match lang {
            Language::English => &self.en,
            Language::Arabic => &self.ar,
        }
    }

    /// Decode `{en: [..], ar: [..]}` keeping only string items.
    fn from_value(value: Option<&Value>) -> Self {
        let strings = |key: &str| -> Vec<String> {
            value
                .and_then(|v| v.get(key))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        Self {
            en: strings("en"),
            ar: strings("ar"),
        }
    }
}

/// A conversational topic with example phrases and candidate replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub tag: String,
    #[serde(default)]
    pub patterns: LocalizedList,
    #[serde(default)]
    pub responses: LocalizedList,
}

/// Ordered, read-only collection of intents with O(1) lookup by tag.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    intents: Vec<Intent>,
    by_tag: HashMap<String, usize>,
}

impl Dataset {
    /// Build from intents, keeping their order.
    ///
    /// When a tag appears twice, lookups resolve to the later definition; both
    /// still contribute example phrases to the index.
    pub fn new(intents: Vec<Intent>) -> Self {
        let mut by_tag = HashMap::with_capacity(intents.len());
        for (position, intent) in intents.iter().enumerate() {
            if by_tag.insert(intent.tag.clone(), position).is_some() {
                warn!(tag = %intent.tag, "Duplicate intent tag; later definition wins lookups");
            }
        }
        Self { intents, by_tag }
    }

    /// Decode a parsed JSON document. Never fails.
    pub fn from_value(value: &Value) -> Self {
        let raw_intents = value
            .get("intents")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut intents = Vec::with_capacity(raw_intents.len());
        for (position, raw) in raw_intents.iter().enumerate() {
            let Some(tag) = raw.get("tag").and_then(Value::as_str) else {
                warn!(position, "Dropping intent without a string tag");
                continue;
            };
            intents.push(Intent {
                tag: tag.to_string(),
                patterns: LocalizedList::from_value(raw.get("patterns")),
                responses: LocalizedList::from_value(raw.get("responses")),
            });
        }

        let dataset = Self::new(intents);
        if dataset.get(FALLBACK_TAG).is_none() {
            warn!(
                "Dataset has no '{}' intent; unmatched queries use the built-in reply",
                FALLBACK_TAG
            );
        }
        dataset
    }

    /// Parse raw JSON text. Fails only on invalid JSON syntax.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value))
    }

    /// Read and parse a dataset file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&raw)?;
        info!("Dataset loaded from {:?}: {} intents", path, dataset.len());
        Ok(dataset)
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Look up an intent by tag
    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.by_tag.get(tag).map(|&i| &self.intents[i])
    }

    /// The distinguished fallback intent, if present.
    pub fn fallback(&self) -> Option<&Intent> {
        self.get(FALLBACK_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_dataset() {
        let raw = r#"{
            "intents": [
                {"tag": "exam_schedule",
                 "patterns": {"en": ["exam timetable"], "ar": ["جدول الامتحانات"]},
                 "responses": {"en": ["See the exams page."], "ar": ["راجع صفحة الاختبارات."]}},
                {"tag": "fallback",
                 "patterns": {"en": [], "ar": []},
                 "responses": {"en": ["Sorry."], "ar": []}}
            ]
        }"#;
        let dataset = Dataset::from_json_str(raw).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.intents()[0].tag, "exam_schedule");
        assert_eq!(dataset.get("exam_schedule").unwrap().patterns.ar.len(), 1);
        assert_eq!(dataset.fallback().unwrap().responses.en, vec!["Sorry."]);
    }

    #[test]
    fn test_malformed_fields_degrade_to_empty() {
        let value = json!({
            "intents": [
                {"tag": "a"},
                {"tag": "b", "patterns": "not an object", "responses": {"en": "nope", "ar": [1, "ok", null]}},
                {"patterns": {"en": ["orphan"]}},
                {"tag": 42}
            ]
        });
        let dataset = Dataset::from_value(&value);
        assert_eq!(dataset.len(), 2);
        let a = dataset.get("a").unwrap();
        assert!(a.patterns.en.is_empty() && a.responses.ar.is_empty());
        let b = dataset.get("b").unwrap();
        assert!(b.patterns.en.is_empty());
        assert!(b.responses.en.is_empty());
        assert_eq!(b.responses.ar, vec!["ok"]);
    }

    #[test]
    fn test_missing_intents_is_empty_dataset() {
        assert!(Dataset::from_value(&json!({})).is_empty());
        assert!(Dataset::from_value(&json!({"intents": "x"})).is_empty());
        assert!(Dataset::from_value(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Dataset::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_duplicate_tag_later_wins_lookup() {
        let value = json!({"intents": [
            {"tag": "dup", "responses": {"en": ["first"]}},
            {"tag": "dup", "responses": {"en": ["second"]}}
        ]});
        let dataset = Dataset::from_value(&value);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get("dup").unwrap().responses.en, vec!["second"]);
    }
}
