//! # Brain Module
//!
//! Bilingual (English/Arabic) FAQ classification and reply resolution.
//! Pure, synchronous and stateless between calls.
//!
//! ## Components
//! - `language`: script-based language detection
//! - `normalize`: per-language text cleanup
//! - `tokenizer`: content tokens without stopwords
//! - `rules`: ordered regex rules evaluated first
//! - `dataset`: intents loaded from JSON
//! - `index`: token sets of every example phrase
//! - `retrieval`: Jaccard scoring over the index
//! - `resolver`: reply pool selection with fallbacks
//! - `suggestions`: quick replies per tag
//! - `analyzer`: main orchestrator

pub mod analyzer;
pub mod classification;
pub mod dataset;
pub mod index;
pub mod language;
pub mod normalize;
pub mod resolver;
pub mod retrieval;
pub mod rules;
pub mod suggestions;
pub mod tokenizer;

pub use analyzer::FaqAssistant;
pub use classification::{Answer, Classification, Source};
pub use dataset::{Dataset, Intent, LocalizedList, FALLBACK_TAG};
pub use index::{IndexEntry, IntentIndex};
pub use language::{detect_language, Language, LanguagePreference};
pub use normalize::normalize;
pub use resolver::{no_answer, resolve_response, FirstPicker, RandomPicker, ReplyPicker};
pub use retrieval::{is_accepted, jaccard, retrieve, MatchResult, DEFAULT_RETRIEVAL_THRESHOLD};
pub use rules::{LocalizedText, Rule, RuleDefinition, RuleSet, BUILTIN_RULES, DEFAULT_RULE_TAG};
pub use suggestions::suggestions_for;
pub use tokenizer::{token_set, tokenize};
