//! FAQ Assistant - Main orchestrator for the Brain module.
//!
//! Combines the stages into one deterministic precedence policy:
//! 1. Rules, matched on normalized text in the detected language (confidence 1)
//! 2. Token-overlap retrieval, accepted when the score reaches the threshold
//! 3. The `fallback` tag otherwise
//!
//! Dataset, index and rules are built once and read-only afterwards, so a
//! single assistant can be shared across sessions behind an `Arc`.

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::classification::{Answer, Classification, Source};
use super::dataset::{Dataset, FALLBACK_TAG};
use super::index::IntentIndex;
use super::language::{detect_language, Language, LanguagePreference};
use super::resolver::{resolve_response, RandomPicker, ReplyPicker};
use super::retrieval::{is_accepted, retrieve, DEFAULT_RETRIEVAL_THRESHOLD};
use super::rules::{Rule, RuleSet};
use crate::error::Result;

/// Main entry point of the classification and response pipeline
pub struct FaqAssistant {
    dataset: Dataset,
    index: IntentIndex,
    rules: RuleSet,
    threshold: f32,
    picker: Box<dyn ReplyPicker>,
}

impl std::fmt::Debug for FaqAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaqAssistant")
            .field("intents", &self.dataset.len())
            .field("index_entries", &self.index.len())
            .field("rules", &self.rules.len())
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl FaqAssistant {
    /// Build the index for `dataset` and take ownership of the compiled rules.
    pub fn new(dataset: Dataset, rules: RuleSet) -> Self {
        let index = IntentIndex::build(&dataset);
        info!(
            "FAQ assistant ready: {} intents, {} index entries ({} en / {} ar), {} rules",
            dataset.len(),
            index.len(),
            index.entries(Language::English).len(),
            index.entries(Language::Arabic).len(),
            rules.len()
        );
        Self {
            dataset,
            index,
            rules,
            threshold: DEFAULT_RETRIEVAL_THRESHOLD,
            picker: Box::new(RandomPicker::from_entropy()),
        }
    }

    /// Load the dataset file and compile the built-in rules.
    pub fn load(dataset_path: &Path) -> Result<Self> {
        let dataset = Dataset::load(dataset_path)?;
        let rules = RuleSet::builtin()?;
        Ok(Self::new(dataset, rules))
    }

    /// Override the retrieval acceptance threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace the reply picker (e.g. a seeded one in tests).
    pub fn with_picker(mut self, picker: impl ReplyPicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn index(&self) -> &IntentIndex {
        &self.index
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    fn classify_inner(
        &self,
        raw: &str,
        detected: Language,
        pref: LanguagePreference,
    ) -> (Classification, Option<&Rule>) {
        let response_language = pref.response_language(detected);

        if let Some(rule) = self.rules.match_rule(raw, detected) {
            let classification = Classification {
                tag: rule.tag().to_string(),
                source: Source::Rule,
                confidence: 1.0,
                detected_language: detected,
                response_language,
                rule_name: Some(rule.name.clone()),
            };
            return (classification, Some(rule));
        }

        let result = retrieve(raw, &self.index, detected);
        debug!(
            tag = ?result.tag,
            score = result.score,
            threshold = self.threshold,
            "Retrieval scored"
        );

        // Zero overlap never counts as a match, whatever the threshold.
        let (tag, source, confidence) = match result.tag {
            Some(tag) if result.score > 0.0 && is_accepted(result.score, self.threshold) => {
                (tag, Source::Retrieval, result.score)
            }
            _ => (FALLBACK_TAG.to_string(), Source::Fallback, 0.0),
        };

        let classification = Classification {
            tag,
            source,
            confidence,
            detected_language: detected,
            response_language,
            rule_name: None,
        };
        (classification, None)
    }

    /// Classify a message. Never fails: unmatched input resolves to `fallback`.
    pub fn classify(&self, raw: &str, pref: LanguagePreference) -> Classification {
        self.classify_in(raw, detect_language(raw), pref)
    }

    /// Classify `raw` as text in `detected`, e.g. a question with an attachment
    /// whose language was detected on the question alone.
    pub fn classify_in(
        &self,
        raw: &str,
        detected: Language,
        pref: LanguagePreference,
    ) -> Classification {
        self.classify_inner(raw, detected, pref).0
    }

    /// Reply text for a tag in the given language
    pub fn resolve_reply(&self, tag: &str, lang: Language) -> String {
        resolve_response(&self.dataset, tag, lang, self.picker.as_ref())
    }

    /// Classify and resolve the reply in one call.
    pub fn answer(&self, raw: &str, pref: LanguagePreference) -> Answer {
        self.answer_in(raw, detect_language(raw), pref)
    }

    /// [`answer`](Self::answer) with a caller-supplied detected language.
    pub fn answer_in(&self, raw: &str, detected: Language, pref: LanguagePreference) -> Answer {
        let start = Instant::now();
        let (classification, rule) = self.classify_inner(raw, detected, pref);

        let reply = match rule {
            Some(rule) => rule.response.get(classification.response_language).to_string(),
            None => self.resolve_reply(&classification.tag, classification.response_language),
        };

        debug!(
            tag = %classification.tag,
            source = %classification.source,
            confidence = classification.confidence,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Answered"
        );
        Answer {
            classification,
            reply,
        }
    }
}
