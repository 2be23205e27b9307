//! Narrative generation client.
//!
//! Talks to a Gemini-style `generateContent` endpoint. The call is
//! text-in/text-out; every failure is mapped to a [`NarrativeError`]
//! that the caller shows to the user instead of aborting.

use crate::config::ModelConfig;
use crate::narrative::prompt::NarrativePrompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Narrative generation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    /// No credential configured. Everything else keeps working.
    #[error("Interpretation is not configured: set GEMINI_API_KEY or pass --api-key")]
    NotConfigured,

    #[error("The model service rejected the credential ({0})")]
    Auth(u16),

    #[error("The model service is rate limiting requests; try again later")]
    RateLimited,

    #[error("The model service did not answer within {0}s")]
    Timeout(u64),

    #[error("Cannot reach the model service: {0}")]
    Network(String),

    #[error("Model service error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response from the model service: {0}")]
    MalformedResponse(String),
}

impl NarrativeError {
    /// Whether trying the same request again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NarrativeError::RateLimited | NarrativeError::Timeout(_) | NarrativeError::Network(_)
        )
    }
}

/// Anything that can turn a prompt into narrative text.
#[allow(async_fn_in_trait)]
pub trait NarrativeBackend {
    /// Generate text for a filled prompt.
    async fn generate(&self, prompt: &NarrativePrompt) -> Result<String, NarrativeError>;
}

// Request/response bodies of the generateContent API.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Extract the text of the first candidate.
fn response_text(body: &str) -> Result<String, NarrativeError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| NarrativeError::MalformedResponse(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(NarrativeError::MalformedResponse(
            "no text in response".to_string(),
        ));
    }

    Ok(text)
}

/// Map an HTTP status to an error.
fn status_error(status: u16, body: String) -> NarrativeError {
    match status {
        401 | 403 => NarrativeError::Auth(status),
        429 => NarrativeError::RateLimited,
        _ => NarrativeError::Api { status, body },
    }
}

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    http_client: reqwest::Client,
    config: ModelConfig,
    api_key: String,
}

impl GeminiClient {
    /// Create a client. Fails with [`NarrativeError::NotConfigured`] when
    /// there is no usable credential; no request is made in that case.
    pub fn new(config: &ModelConfig, api_key: Option<&str>) -> Result<Self, NarrativeError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(NarrativeError::NotConfigured)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NarrativeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config: config.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// Endpoint for the configured model.
    fn endpoint(&self) -> String {
        let model = if self.config.name.starts_with("models/") {
            self.config.name.clone()
        } else {
            format!("models/{}", self.config.name)
        };

        format!(
            "{}/v1beta/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            model
        )
    }
}

impl NarrativeBackend for GeminiClient {
    async fn generate(&self, prompt: &NarrativePrompt) -> Result<String, NarrativeError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &prompt.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt.user }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        if !prompt.is_filled() {
            warn!("Sending a prompt without its summary table");
        }
        debug!("Requesting interpretation from {}", self.config.name);

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarrativeError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    NarrativeError::Network(format!("cannot connect to {}", self.config.api_url))
                } else {
                    NarrativeError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                NarrativeError::Timeout(self.config.timeout_seconds)
            } else {
                NarrativeError::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), body));
        }

        response_text(&body)
    }
}

/// Retry behavior for transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: usize,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Generate with retries on rate limiting, timeouts and network errors.
///
/// The wait doubles after each failed attempt.
pub async fn generate_with_retry<B: NarrativeBackend>(
    backend: &B,
    prompt: &NarrativePrompt,
    policy: RetryPolicy,
) -> Result<String, NarrativeError> {
    let mut attempt = 0;
    let mut delay = policy.backoff;

    loop {
        match backend.generate(prompt).await {
            Ok(text) => {
                info!("Interpretation received ({} chars)", text.len());
                return Ok(text);
            }
            Err(e) if e.is_transient() && attempt < policy.retries => {
                attempt += 1;
                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}",
                    attempt, e, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Backend returning scripted results, for tests.
#[cfg(test)]
pub struct MockBackend {
    results: std::sync::Mutex<std::collections::VecDeque<Result<String, NarrativeError>>>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(results: Vec<Result<String, NarrativeError>>) -> Self {
        Self {
            results: std::sync::Mutex::new(results.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl NarrativeBackend for MockBackend {
    async fn generate(&self, prompt: &NarrativePrompt) -> Result<String, NarrativeError> {
        assert!(prompt.is_filled(), "prompt sent without summary");
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("mock interpretation".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> NarrativePrompt {
        NarrativePrompt::for_metric("Stability Score").with_summary("NSEO 90 95")
    }

    fn no_wait(retries: usize) -> RetryPolicy {
        RetryPolicy {
            retries,
            backoff: Duration::ZERO,
        }
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let config = ModelConfig::default();
        assert_eq!(
            GeminiClient::new(&config, None).err(),
            Some(NarrativeError::NotConfigured)
        );
        assert_eq!(
            GeminiClient::new(&config, Some("   ")).err(),
            Some(NarrativeError::NotConfigured)
        );
    }

    #[test]
    fn test_endpoint() {
        let mut config = ModelConfig::default();
        let client = GeminiClient::new(&config, Some("key")).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );

        config.name = "gemini-2.5-flash".to_string();
        config.api_url = "http://localhost:8080/".to_string();
        let client = GeminiClient::new(&config, Some("key")).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_error(401, String::new()), NarrativeError::Auth(401));
        assert_eq!(status_error(403, String::new()), NarrativeError::Auth(403));
        assert_eq!(status_error(429, String::new()), NarrativeError::RateLimited);
        assert!(matches!(
            status_error(500, "boom".to_string()),
            NarrativeError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_response_text() {
        let body = r####"{"candidates":[{"content":{"role":"model","parts":[{"text":"### Interpretation"},{"text":" for NSEO"}]}}]}"####;
        assert_eq!(response_text(body).unwrap(), "### Interpretation for NSEO");

        assert!(matches!(
            response_text(r#"{"candidates":[]}"#),
            Err(NarrativeError::MalformedResponse(_))
        ));
        assert!(matches!(
            response_text("<html>"),
            Err(NarrativeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "query" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: None,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(json["contents"][0]["role"], "user");
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_retry_on_transient_errors() {
        let backend = MockBackend::new(vec![
            Err(NarrativeError::RateLimited),
            Err(NarrativeError::Network("reset".to_string())),
            Ok("done".to_string()),
        ]);

        let result = tokio_test::block_on(generate_with_retry(&backend, &prompt(), no_wait(2)));

        assert_eq!(result.unwrap(), "done");
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_no_retry_on_auth() {
        let backend = MockBackend::new(vec![Err(NarrativeError::Auth(401))]);

        let result = tokio_test::block_on(generate_with_retry(&backend, &prompt(), no_wait(3)));

        assert_eq!(result, Err(NarrativeError::Auth(401)));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_retries_exhausted() {
        let backend = MockBackend::new(vec![
            Err(NarrativeError::Timeout(5)),
            Err(NarrativeError::Timeout(5)),
        ]);

        let result = tokio_test::block_on(generate_with_retry(&backend, &prompt(), no_wait(1)));

        assert_eq!(result, Err(NarrativeError::Timeout(5)));
        assert_eq!(backend.call_count(), 2);
    }
}
