//! Application configuration.
//!
//! Every setting has a default; environment variables (optionally from a
//! `.env` file) override them. Values are validated once at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::brain::retrieval::DEFAULT_RETRIEVAL_THRESHOLD;
use crate::error::{AppError, Result};
use crate::fs_manager::{PortablePathManager, HOME_ENV};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/chat";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 12_000;
pub const DEFAULT_API_RETRIES: u32 = 2;
pub const DEFAULT_API_BACKOFF_MS: u64 = 450;
pub const DEFAULT_ATTACHMENT_MAX_CHARS: usize = 6_000;

/// Where answers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// In-process rules and retrieval
    #[default]
    Local,
    /// Remote chat API
    Api,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Local => "local",
            ChatMode::Api => "api",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ChatMode::Local),
            "api" => Ok(ChatMode::Api),
            other => Err(AppError::Config(format!("Unknown mode '{}'", other))),
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("Unknown log format '{}'", other))),
        }
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Application home; data lives under `<home>/data`.
    pub home: PathBuf,
    pub dataset_path: PathBuf,
    pub transcript_path: PathBuf,
    pub mode: ChatMode,
    /// Remote chat endpoint used in API mode.
    #[validate(url)]
    pub api_url: String,
    /// Sent as `x-api-key` when present.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request timeout.
    #[validate(range(min = 100, max = 300_000))]
    pub api_timeout_ms: u64,
    /// Extra attempts after the first one, for timeouts and network errors.
    #[validate(range(max = 10))]
    pub api_retries: u32,
    #[validate(range(min = 1, max = 60_000))]
    pub api_backoff_ms: u64,
    /// Minimum retrieval score accepted as a match. Arbitrary; kept tunable.
    #[validate(range(min = 0.0, max = 1.0))]
    pub retrieval_threshold: f32,
    #[validate(range(min = 1))]
    pub attachment_max_chars: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_paths(PortablePathManager::discover())
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e)))
}

impl AppConfig {
    fn with_paths(paths: PortablePathManager) -> Self {
        Self {
            home: paths.root_dir().to_path_buf(),
            dataset_path: paths.dataset_path(),
            transcript_path: paths.transcript_path(),
            mode: ChatMode::Local,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_timeout_ms: DEFAULT_API_TIMEOUT_MS,
            api_retries: DEFAULT_API_RETRIES,
            api_backoff_ms: DEFAULT_API_BACKOFF_MS,
            retrieval_threshold: DEFAULT_RETRIEVAL_THRESHOLD,
            attachment_max_chars: DEFAULT_ATTACHMENT_MAX_CHARS,
            log_format: LogFormat::Pretty,
        }
    }

    /// Read `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self> {
        // A missing .env file is normal.
        let _ = dotenv::dotenv();
        Self::from_env()
    }

    /// Build from the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let paths = match lookup(HOME_ENV) {
            Some(home) => PortablePathManager::new(home),
            None => PortablePathManager::discover(),
        };
        let mut config = Self::with_paths(paths);

        if let Some(v) = lookup("IASC_DATASET_PATH") {
            config.dataset_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("IASC_TRANSCRIPT_PATH") {
            config.transcript_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("IASC_MODE") {
            config.mode = v.parse()?;
        }
        if let Some(v) = lookup("IASC_API_URL") {
            config.api_url = v.trim().to_string();
        }
        config.api_key = lookup("IASC_API_KEY").map(|v| v.trim().to_string());
        if let Some(v) = lookup("IASC_API_TIMEOUT_MS") {
            config.api_timeout_ms = parse_var("IASC_API_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("IASC_API_RETRIES") {
            config.api_retries = parse_var("IASC_API_RETRIES", &v)?;
        }
        if let Some(v) = lookup("IASC_API_BACKOFF_MS") {
            config.api_backoff_ms = parse_var("IASC_API_BACKOFF_MS", &v)?;
        }
        if let Some(v) = lookup("IASC_RETRIEVAL_THRESHOLD") {
            let threshold: f32 = parse_var("IASC_RETRIEVAL_THRESHOLD", &v)?;
            if !threshold.is_finite() {
                return Err(AppError::Config(format!(
                    "IASC_RETRIEVAL_THRESHOLD must be a number, got '{}'",
                    v
                )));
            }
            config.retrieval_threshold = threshold;
        }
        if let Some(v) = lookup("IASC_ATTACHMENT_MAX_CHARS") {
            config.attachment_max_chars = parse_var("IASC_ATTACHMENT_MAX_CHARS", &v)?;
        }
        if let Some(v) = lookup("IASC_LOG_FORMAT") {
            config.log_format = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    pub fn api_backoff(&self) -> Duration {
        Duration::from_millis(self.api_backoff_ms)
    }
}
