//! Preflight Check System
//!
//! Verifies what the assistant needs before the first question: a readable
//! dataset, compilable rules, a writable transcript directory and, in API mode,
//! a reachable API.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{info, warn};

use crate::backend::ApiClient;
use crate::brain::{Dataset, RuleSet};
use crate::config::{AppConfig, ChatMode};

/// Result of a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete preflight report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightReport {
    pub all_passed: bool,
    pub checks: Vec<CheckResult>,
    /// Local answering works (dataset and rules)
    pub local_ready: bool,
    pub summary: String,
}

impl PreflightReport {
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Run every check that applies to `config`.
pub async fn run_preflight_checks(config: &AppConfig) -> PreflightReport {
    info!("Running preflight checks");

    let mut checks = vec![
        check_dataset(&config.dataset_path),
        check_rules(),
        check_transcript_dir(&config.transcript_path),
    ];

    if config.mode == ChatMode::Api {
        checks.push(check_api(config).await);
    }

    let all_passed = checks.iter().all(|c| c.passed);
    let local_ready = checks
        .iter()
        .filter(|c| matches!(c.name.as_str(), "dataset" | "rules"))
        .all(|c| c.passed);

    let summary = if all_passed {
        "All checks passed. System ready.".to_string()
    } else if local_ready {
        "Some checks failed. Local answers still work.".to_string()
    } else {
        "Dataset or rules unavailable. Local answers are offline.".to_string()
    };

    for check in &checks {
        if check.passed {
            info!("  ok   {}: {}", check.name, check.message);
        } else {
            warn!("  FAIL {}: {}", check.name, check.message);
            if let Some(details) = &check.details {
                warn!("       {}", details);
            }
        }
    }
    info!("Summary: {}", summary);

    PreflightReport {
        all_passed,
        checks,
        local_ready,
        summary,
    }
}

fn check_dataset(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::fail(
            "dataset",
            "Dataset file not found",
            Some(format!("Expected at: {:?}", path)),
        );
    }
    match Dataset::load(path) {
        Ok(dataset) if dataset.is_empty() => CheckResult::fail(
            "dataset",
            "Dataset has no usable intents",
            Some(format!("{:?}", path)),
        ),
        Ok(dataset) => {
            let message = if dataset.fallback().is_some() {
                format!("Dataset OK ({} intents)", dataset.len())
            } else {
                format!("Dataset OK ({} intents, no fallback intent)", dataset.len())
            };
            CheckResult::pass("dataset", &message)
        }
        Err(e) => CheckResult::fail("dataset", "Cannot read dataset", Some(e.to_string())),
    }
}

fn check_rules() -> CheckResult {
    match RuleSet::builtin() {
        Ok(rules) => CheckResult::pass("rules", &format!("{} rules compiled", rules.len())),
        Err(e) => CheckResult::fail("rules", "Rule patterns do not compile", Some(e.to_string())),
    }
}

fn check_transcript_dir(transcript_path: &Path) -> CheckResult {
    let Some(dir) = transcript_path.parent() else {
        return CheckResult::fail("transcript_dir", "Transcript path has no directory", None);
    };
    if let Err(e) = std::fs::create_dir_all(dir) {
        return CheckResult::fail(
            "transcript_dir",
            "Cannot create transcript directory",
            Some(e.to_string()),
        );
    }

    let probe = dir.join(".preflight-probe");
    let result = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&probe);
    let _ = std::fs::remove_file(&probe);

    match result {
        Ok(_) => CheckResult::pass("transcript_dir", &format!("Writable: {:?}", dir)),
        Err(e) => CheckResult::fail(
            "transcript_dir",
            "Transcript directory is not writable",
            Some(e.to_string()),
        ),
    }
}

async fn check_api(config: &AppConfig) -> CheckResult {
    let client = match ApiClient::from_config(config) {
        Ok(client) => client,
        Err(e) => return CheckResult::fail("api", "API URL invalid", Some(e.to_string())),
    };
    let health = client.health().await;
    if health.ok {
        CheckResult::pass("api", &health.message)
    } else {
        CheckResult::fail(
            "api",
            &health.message,
            health.status.map(|s| format!("HTTP {}", s)),
        )
    }
}
