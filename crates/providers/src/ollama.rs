//! Ollama provider implementation.
//!
//! Talks to the native `/api/generate` endpoint with `stream: false`: one
//! flattened prompt in, one complete response out.
//!
//! Failures are classified for the caller:
//! - no response at all → [`ProviderError::Transport`]
//! - client timeout elapsed → [`ProviderError::Timeout`]
//! - non-2xx status → [`ProviderError::Protocol`] with the raw body
//! - 2xx with an unreadable body → [`ProviderError::InvalidResponse`]

use std::time::Duration;

use async_trait::async_trait;
use ollachat_config::ChatConfig;
use ollachat_core::error::ProviderError;
use ollachat_core::provider::{GenerationRequest, GenerationResponse, InferenceClient};
use tracing::{debug, warn};

/// Response fields we know about, in their canonical (snake_case) spelling.
const RESPONSE_FIELDS: &[&str] = &[
    "model",
    "created_at",
    "response",
    "done",
    "done_reason",
    "context",
    "total_duration",
    "load_duration",
    "prompt_eval_count",
    "prompt_eval_duration",
    "eval_count",
    "eval_duration",
];

/// A client for a locally hosted Ollama server.
pub struct OllamaClient {
    name: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "ollama".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// Create a client from validated configuration.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ProviderError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Map a reqwest failure onto transport vs. timeout.
    fn classify(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(format!(
                "no response from {} within {}s",
                self.base_url,
                self.timeout.as_secs_f64()
            ))
        } else {
            ProviderError::Transport(error_chain(err))
        }
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        let url = self.generate_url();

        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Ollama returned error");
            return Err(ProviderError::Protocol {
                status_code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(&e))?;
        let parsed = parse_response(&body)?;

        debug!(
            provider = %self.name,
            done = parsed.done,
            eval_count = ?parsed.eval_count,
            total_duration_ns = ?parsed.total_duration,
            "Generation completed"
        );

        Ok(parsed)
    }
}

/// Parse a response body, matching field names case-insensitively.
///
/// `Response`, `RESPONSE` and `response` are the same field, and so are
/// `evalCount` and `eval_count`. Unknown keys pass through untouched.
fn parse_response(body: &str) -> Result<GenerationResponse, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let serde_json::Value::Object(fields) = value else {
        return Err(ProviderError::InvalidResponse(
            "expected a JSON object".into(),
        ));
    };

    let normalized: serde_json::Map<String, serde_json::Value> = fields
        .into_iter()
        .map(|(key, value)| (canonical_key(&key), value))
        .collect();

    serde_json::from_value(serde_json::Value::Object(normalized))
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn canonical_key(key: &str) -> String {
    let folded = fold(key);
    RESPONSE_FIELDS
        .iter()
        .find(|field| fold(field) == folded)
        .map_or_else(|| key.to_string(), |field| (*field).to_string())
}

fn fold(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Render an error followed by its source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
