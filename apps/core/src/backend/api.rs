use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};
use url::Url;

use super::{ChatBackend, ChatReply, ChatRequest};
use crate::config::{AppConfig, ChatMode};
use crate::error::{AppError, Result};

// --- Constants ---
const HEALTH_TIMEOUT: Duration = Duration::from_secs(6);
const API_KEY_HEADER: &str = "x-api-key";

/// Connection settings for the remote chat API
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub url: String,
    pub api_key: Option<String>,
    /// Per attempt
    pub timeout: Duration,
    /// Extra attempts after the first, for timeouts and network errors only
    pub retries: u32,
    /// Base delay, doubled after each failed attempt
    pub backoff: Duration,
}

impl ApiSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout: config.api_timeout(),
            retries: config.api_retries,
            backoff: config.api_backoff(),
        }
    }
}

/// Result of probing the API's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    pub has_model: bool,
    pub message: String,
}

/// Health endpoint for a chat URL: a trailing `/chat` becomes `/health`,
/// any other path is replaced by `/health`.
pub fn health_url_from_chat_url(chat_url: &str) -> Result<Url> {
    let mut url = Url::parse(chat_url)?;
    let path = url.path().to_string();
    let trimmed = path.strip_suffix('/').unwrap_or(&path);
    let new_path = match trimmed.strip_suffix("/chat") {
        Some(prefix) => format!("{}/health", prefix),
        None if path.ends_with("/health") => path.clone(),
        None => "/health".to_string(),
    };
    url.set_path(&new_path);
    Ok(url)
}

/// Client for the remote chat API (`POST {text, lang, user_name}`).
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    settings: ApiSettings,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        // Fail fast on a malformed URL.
        Url::parse(&settings.url)?;
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(ApiSettings::from_config(config))
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.settings.api_key {
            match HeaderValue::from_str(key) {
                Ok(value) => {
                    headers.insert(API_KEY_HEADER, value);
                }
                Err(e) => warn!("API key is not a valid header value, not sent: {}", e),
            }
        }
        headers
    }

    async fn send_once(&self, payload: &Value) -> Result<Value> {
        let res = self
            .client
            .post(&self.settings.url)
            .headers(self.headers())
            .json(payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let body = if body.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body
            };
            return Err(AppError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json::<Value>().await?)
    }

    /// Single attempt, bounded by the request timeout.
    async fn call(&self, payload: &Value) -> Result<Value> {
        let secs = self.settings.timeout.as_secs_f32().round() as u64;
        timeout(self.settings.timeout, self.send_once(payload))
            .await
            .map_err(|_| AppError::Timeout(format!("API request timed out after {}s.", secs)))?
    }

    /// Send a message, retrying timeouts and network errors with exponential backoff.
    pub async fn chat(&self, text: &str, lang: &str, user_name: &str) -> Result<Value> {
        let payload = json!({ "text": text, "lang": lang, "user_name": user_name });
        let mut attempt: u32 = 0;
        loop {
            match self.call(&payload).await {
                Ok(out) => return Ok(out),
                Err(e) if e.is_retryable() && attempt < self.settings.retries => {
                    let delay = self.settings.backoff * 2u32.saturating_pow(attempt);
                    warn!(attempt, ?delay, "API request failed, retrying: {}", e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Probe the health endpoint derived from the chat URL.
    pub async fn health(&self) -> HealthStatus {
        let url = match health_url_from_chat_url(&self.settings.url) {
            Ok(url) => url,
            Err(_) => {
                return HealthStatus {
                    ok: false,
                    status: None,
                    has_model: false,
                    message: "API URL invalid".to_string(),
                }
            }
        };

        let probe = async {
            let res = self.client.get(url.clone()).send().await?;
            let status = res.status();
            let body: Value = if status.is_success() {
                res.json().await.unwrap_or(Value::Null)
            } else {
                Value::Null
            };
            Ok::<_, reqwest::Error>((status, body))
        };

        let status = match timeout(HEALTH_TIMEOUT, probe).await {
            Err(_) => HealthStatus {
                ok: false,
                status: None,
                has_model: false,
                message: "Health timeout".to_string(),
            },
            Ok(Err(e)) => {
                warn!("Health check failed: {}", e);
                HealthStatus {
                    ok: false,
                    status: None,
                    has_model: false,
                    message: "API offline".to_string(),
                }
            }
            Ok(Ok((status, _))) if !status.is_success() => HealthStatus {
                ok: false,
                status: Some(status.as_u16()),
                has_model: false,
                message: format!("Health {}", status.as_u16()),
            },
            Ok(Ok((status, body))) => {
                let has_model = body
                    .get("has_model")
                    .map(|v| match v {
                        Value::Bool(b) => *b,
                        Value::Null => false,
                        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
                        Value::String(s) => !s.is_empty(),
                        _ => true,
                    })
                    .unwrap_or(false);
                HealthStatus {
                    ok: true,
                    status: Some(status.as_u16()),
                    has_model,
                    message: if has_model {
                        "API OK (model)".to_string()
                    } else {
                        "API OK (no model)".to_string()
                    },
                }
            }
        };
        info!(url = %url, ok = status.ok, "API health: {}", status.message);
        status
    }
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn lenient_number(value: Option<&Value>) -> f32 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) as f32,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Map an API response onto a reply, filling the documented defaults.
pub fn reply_from_response(out: &Value, response_lang: &str) -> ChatReply {
    ChatReply {
        text: out.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
        tag: non_empty_str(out, "intent").unwrap_or_else(|| "unknown".to_string()),
        source: non_empty_str(out, "source").unwrap_or_else(|| "api".to_string()),
        confidence: lenient_number(out.get("confidence")),
        lang: non_empty_str(out, "lang").unwrap_or_else(|| response_lang.to_string()),
        analytics: out.get("analytics").filter(|v| !v.is_null()).cloned(),
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn reply(&self, request: &ChatRequest) -> Result<ChatReply> {
        let lang = request.response_language();
        let out = self.chat(&request.text, lang.code(), &request.user_name).await?;
        Ok(reply_from_response(&out, lang.code()))
    }

    fn mode(&self) -> ChatMode {
        ChatMode::Api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::LanguagePreference;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server_uri: &str, retries: u32, timeout_ms: u64, key: Option<&str>) -> ApiClient {
        ApiClient::new(ApiSettings {
            url: format!("{}/chat", server_uri),
            api_key: key.map(str::to_string),
            timeout: Duration::from_millis(timeout_ms),
            retries,
            backoff: Duration::from_millis(10),
        })
        .unwrap()
    }

    #[test]
    fn test_health_url_derivation() {
        let u = |s: &str| health_url_from_chat_url(s).unwrap().to_string();
        assert_eq!(u("http://127.0.0.1:5000/chat"), "http://127.0.0.1:5000/health");
        assert_eq!(u("https://x.edu/api/chat/"), "https://x.edu/api/health");
        assert_eq!(u("https://x.edu/ask"), "https://x.edu/health");
        assert_eq!(u("https://x.edu/v1/health"), "https://x.edu/v1/health");
        assert!(health_url_from_chat_url("not a url").is_err());
    }

    #[test]
    fn test_response_defaults() {
        let reply = reply_from_response(&json!({}), "ar");
        assert_eq!(reply.text, "");
        assert_eq!(reply.tag, "unknown");
        assert_eq!(reply.source, "api");
        assert_eq!(reply.confidence, 0.0);
        assert_eq!(reply.lang, "ar");
        assert!(reply.analytics.is_none());

        let reply = reply_from_response(&json!({"intent": "", "confidence": "0.5"}), "en");
        assert_eq!(reply.tag, "unknown");
        assert_eq!(reply.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_chat_success_sends_payload_and_key() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("x-api-key", "s3cret"))
            .and(body_json(json!({"text": "exam dates", "lang": "en", "user_name": "Sara"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "Exams start on May 5.",
                "intent": "exam_schedule",
                "source": "model",
                "confidence": 0.91,
                "lang": "en"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        let api = client(&mock_server.uri(), 2, 2_000, Some("s3cret"));

        // 2. Act
        let reply = api
            .reply(&ChatRequest::new("exam dates", LanguagePreference::Auto, "Sara"))
            .await
            .unwrap();

        // 3. Assert
        assert_eq!(reply.text, "Exams start on May 5.");
        assert_eq!(reply.tag, "exam_schedule");
        assert_eq!(reply.source, "model");
        assert!((reply.confidence - 0.91).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .expect(1)
            .mount(&mock_server)
            .await;
        let api = client(&mock_server.uri(), 2, 2_000, None);

        let result = api.chat("hi", "en", "Guest").await;

        match result {
            Err(AppError::Api { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("Internal Server Error"));
            }
            other => panic!("Expected AppError::Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_retried_then_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(2)
            .mount(&mock_server)
            .await;
        let api = client(&mock_server.uri(), 1, 100, None);

        let result = api.chat("hi", "en", "Guest").await;

        assert!(matches!(result, Err(AppError::Timeout(_))), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_network_error_is_retryable() {
        // Nothing listens on this port once the server is dropped.
        let uri = {
            let server = MockServer::builder().start().await;
            server.uri()
        };
        let api = client(&uri, 1, 500, None);
        let err = api.chat("hi", "en", "Guest").await.unwrap_err();
        assert!(err.is_retryable(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "ok", "has_model": true})),
            )
            .mount(&mock_server)
            .await;
        let api = client(&mock_server.uri(), 0, 1_000, None);

        let health = api.health().await;

        assert!(health.ok);
        assert!(health.has_model);
        assert_eq!(health.message, "API OK (model)");
    }

    #[tokio::test]
    async fn test_health_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;
        let api = client(&mock_server.uri(), 0, 1_000, None);

        let health = api.health().await;

        assert!(!health.ok);
        assert_eq!(health.status, Some(503));
        assert_eq!(health.message, "Health 503");
    }
}
