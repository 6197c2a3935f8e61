//! Integration Tests
//!
//! End-to-end flows over the shipped dataset, configuration loading, the
//! transcript file and the remote API (mocked with wiremock).

use crate::backend::{ApiClient, ChatBackend, LocalBackend};
use crate::brain::{
    suggestions_for, Dataset, FaqAssistant, Language, LanguagePreference, RandomPicker, RuleSet,
    Source,
};
use crate::config::{AppConfig, ChatMode};
use crate::dashboard::DashboardFilter;
use crate::preflight::run_preflight_checks;
use crate::session::{ChatSession, ReplyKind};
use crate::transcript::TranscriptStore;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Fixtures
// ============================================================================

fn shipped_dataset_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("data.json")
}

fn shipped_assistant(seed: u64) -> FaqAssistant {
    FaqAssistant::load(&shipped_dataset_path())
        .unwrap()
        .with_picker(RandomPicker::seeded(seed))
}

/// Configuration rooted in `home`, with the shipped dataset copied in.
fn config_with(home: &TempDir, extra: &[(&str, String)]) -> AppConfig {
    let data_dir = home.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::copy(shipped_dataset_path(), data_dir.join("data.json")).unwrap();

    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("IASC_HOME".to_string(), home.path().display().to_string());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.clone());
    }
    AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

// ============================================================================
// Shipped dataset
// ============================================================================

#[test]
fn test_shipped_dataset_is_complete() {
    let dataset = Dataset::load(&shipped_dataset_path()).unwrap();
    let fallback = dataset.fallback().expect("fallback intent");
    assert!(!fallback.responses.en.is_empty());
    assert!(!fallback.responses.ar.is_empty());

    for intent in dataset.intents() {
        assert!(
            !intent.responses.en.is_empty() || !intent.responses.ar.is_empty(),
            "Intent '{}' has no replies",
            intent.tag
        );
    }
    // Tags with dedicated quick replies exist in the dataset
    let tags = [
        "course_registration_deadline",
        "exam_schedule",
        "gpa_calculation",
        "library_access",
    ];
    for tag in tags {
        assert!(dataset.get(tag).is_some(), "Missing intent '{}'", tag);
    }
}

#[test]
fn test_shipped_dataset_scenarios() {
    let brain = shipped_assistant(11);

    let c = brain.classify("hello", LanguagePreference::Auto);
    assert_eq!((c.source, c.tag.as_str()), (Source::Rule, "greeting"));

    let c = brain.classify("مرحبا", LanguagePreference::Auto);
    assert_eq!((c.source, c.tag.as_str()), (Source::Rule, "greeting"));
    assert_eq!(c.detected_language, Language::Arabic);

    let c = brain.classify("when are the final exams", LanguagePreference::Auto);
    assert_eq!((c.source, c.tag.as_str()), (Source::Retrieval, "exam_schedule"));

    let c = brain.classify("متى آخر موعد للتسجيل", LanguagePreference::Auto);
    assert_eq!((c.source, c.tag.as_str()), (Source::Retrieval, "course_registration_deadline"));

    let answer = brain.answer("", LanguagePreference::Auto);
    assert_eq!(answer.classification.tag, "fallback");
    assert!(brain.dataset().fallback().unwrap().responses.en.contains(&answer.reply));
}

#[test]
fn test_every_reply_comes_from_its_pool() {
    let brain = shipped_assistant(5);
    for intent in brain.dataset().intents() {
        for lang in Language::ALL {
            for pattern in intent.patterns.get(lang) {
                let answer = brain.answer(pattern, LanguagePreference::Auto);
                let c = &answer.classification;
                if c.source == Source::Rule {
                    continue;
                }
                let pool = brain.dataset().get(&c.tag).unwrap().responses.get(lang);
                assert!(pool.contains(&answer.reply), "'{}' -> '{}'", pattern, answer.reply);
            }
        }
    }
}

// ============================================================================
// Full session over files on disk
// ============================================================================

#[tokio::test]
async fn test_local_session_from_config() {
    let home = TempDir::new().unwrap();
    let config = config_with(&home, &[]);
    assert_eq!(config.mode, ChatMode::Local);

    let report = run_preflight_checks(&config).await;
    assert!(report.all_passed, "{:?}", report.checks);

    let dataset = Dataset::load(&config.dataset_path).unwrap();
    let assistant = FaqAssistant::new(dataset, RuleSet::builtin().unwrap())
        .with_threshold(config.retrieval_threshold)
        .with_picker(RandomPicker::seeded(1));
    let local: Arc<dyn ChatBackend> = Arc::new(LocalBackend::new(Arc::new(assistant)));
    let store = Arc::new(TranscriptStore::open(&config.transcript_path).unwrap());
    let mut session = ChatSession::new(Some(local), None, Some(store));
    session.set_user_name("Omar");

    let reply = session.ask("how is my gpa calculated").await.unwrap().unwrap();
    assert_eq!(reply.kind, ReplyKind::Answered);
    assert_eq!(reply.suggestions, suggestions_for("gpa_calculation", Language::English));

    session.ask("كيف يحسب المعدل").await.unwrap();

    assert!(config.transcript_path.starts_with(home.path()));
    let report = session.dashboard(&DashboardFilter::default()).unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.users, vec!["Omar"]);
    assert_eq!(report.intents, vec![("gpa_calculation".to_string(), 2)]);
    assert_eq!(
        report.combined[..2],
        [("lang:en".to_string(), 1), ("lang:ar".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_api_session_against_mock_server() {
    // 1. Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"text": "when is the final?", "lang": "en", "user_name": "Guest"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Finals start on June 10.",
            "intent": "exam_schedule",
            "source": "model",
            "confidence": 0.82,
            "analytics": {"sentiment": {"label": "neutral"}, "entities": [{"text": "final"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let config = config_with(
        &home,
        &[
            ("IASC_MODE", "api".to_string()),
            ("IASC_API_URL", format!("{}/chat", server.uri())),
        ],
    );
    let remote: Arc<dyn ChatBackend> = Arc::new(ApiClient::from_config(&config).unwrap());
    let store = Arc::new(TranscriptStore::open(&config.transcript_path).unwrap());
    let mut session = ChatSession::new(None, Some(remote), Some(store.clone()));
    session.set_mode(config.mode);

    // 2. Act
    let reply = session.ask("when is the final?").await.unwrap().unwrap();

    // 3. Assert
    assert_eq!(reply.text, "Finals start on June 10.");
    assert_eq!(reply.meta, "model • exam_schedule • 0.82 • neutral sentiment • 1 entities");
    let turns = store.load().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].mode, ChatMode::Api);
    assert_eq!(turns[0].source, "model");
}

#[tokio::test]
async fn test_api_server_error_reaches_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let config = config_with(&home, &[("IASC_API_URL", format!("{}/chat", server.uri()))]);
    let remote: Arc<dyn ChatBackend> = Arc::new(ApiClient::from_config(&config).unwrap());
    let mut session = ChatSession::new(None, Some(remote), None);
    session.set_mode(ChatMode::Api);

    let reply = session.ask("hello").await.unwrap().unwrap();
    assert_eq!(reply.kind, ReplyKind::ApiError);
    assert!(reply.text.contains("503"));
    assert!(reply.text.contains("model loading"));
}
