use std::io;
use thiserror::Error;

/// Crate-wide error type.
///
/// Classification itself never fails: malformed dataset entries degrade to empty
/// collections and unmatched queries resolve to the fallback intent. The variants
/// below cover startup configuration, I/O and the remote API surface.
#[derive(Debug, Error)]
pub enum AppError {
    /// Standard input/output errors (dataset, transcript, attachments).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or missing configuration detected at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rule pattern failed to compile. Fatal at load time, never per query.
    #[error("Invalid pattern in rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// Data validation errors (invalid JSON syntax, invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failures writing CSV exports.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Transport-level HTTP failures talking to the remote API.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote API answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// An operation that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether a remote call failing with this error is worth retrying.
    ///
    /// Timeouts and network failures are retried; HTTP error statuses are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::Http(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("API request timed out: {}", err))
        } else if let Some(status) = err.status() {
            AppError::Api {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_decode() {
            AppError::Validation(format!("Invalid API response: {}", err))
        } else {
            AppError::Http(err.to_string())
        }
    }
}
