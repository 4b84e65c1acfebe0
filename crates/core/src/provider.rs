//! Inference client trait — the abstraction over the generation backend.
//!
//! An [`InferenceClient`] knows how to send one flattened prompt to a model
//! and get one complete reply back. There is no streaming path: every request
//! is sent with `stream: false`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;

/// Prompt sent by [`InferenceClient::probe`].
pub const PROBE_PROMPT: &str = "Hello";

/// A single generation request, built fresh for every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "llama3.2", "deepseek-r1:7b")
    pub model: String,

    /// The complete flattened prompt
    pub prompt: String,

    /// Always false; the client only understands complete responses
    #[serde(default)]
    pub stream: bool,

    /// Sampling options; omitted entirely when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

impl GenerationRequest {
    /// A non-streaming request with backend-default sampling.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            options: None,
        }
    }

    /// Set the sampling options.
    pub fn with_options(mut self, temperature: f64, top_p: f64) -> Self {
        self.options = Some(GenerationOptions { temperature, top_p });
        self
    }
}

/// Sampling options nested under `"options"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
}

/// A complete (non-streaming) generation response.
///
/// Only `text` is consumed by the conversation engine. Everything else is
/// telemetry the backend may or may not send; a telemetry value of the wrong
/// shape reads as `None` instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text; `null` or missing when the model produced nothing
    #[serde(default, rename = "response")]
    pub text: Option<String>,

    #[serde(default)]
    pub done: bool,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub done_reason: Option<String>,

    /// Token context the backend can use to continue the generation
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub context: Option<Vec<i64>>,

    /// Durations are in nanoseconds.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_duration: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub load_duration: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub prompt_eval_count: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub prompt_eval_duration: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub eval_count: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub eval_duration: Option<u64>,
}

/// Decode an optional telemetry field, mapping any unexpected value to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Other(IgnoredAny),
    }

    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => Some(value),
        Lenient::Other(_) => None,
    })
}

impl GenerationResponse {
    /// Whether the response carries any text at all.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// The inference client trait.
///
/// Implementations perform exactly one attempt per call. A failed call is
/// reported as a [`ProviderError`]; retrying is the caller's decision.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// The base URL requests are sent to.
    fn base_url(&self) -> &str;

    /// Send a request and get a complete response.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError>;

    /// Connectivity check — can the backend actually generate with `model`?
    ///
    /// Goes through [`generate`](Self::generate) with a fixed prompt rather
    /// than a liveness endpoint, so a broken generation path reads as
    /// unreachable. Never fails: every error becomes `false`.
    async fn probe(&self, model: &str) -> bool {
        match self.generate(GenerationRequest::new(model, PROBE_PROMPT)).await {
            Ok(response) => {
                let ok = response.has_text();
                debug!(client = %self.name(), model, ok, "Probe completed");
                ok
            }
            Err(e) => {
                debug!(client = %self.name(), model, error = %e, "Probe failed");
                false
            }
        }
    }
}
