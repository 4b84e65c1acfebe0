//! Shared test helpers for session tests.

use ollachat_core::error::ProviderError;
use ollachat_core::provider::{GenerationRequest, GenerationResponse, InferenceClient};
use std::sync::Mutex;

/// A mock client that returns a sequence of scripted outcomes.
///
/// Each call to `generate` pops the next outcome and records the request.
/// Panics if more calls are made than outcomes provided.
pub struct ScriptedClient {
    outcomes: Mutex<Vec<Result<GenerationResponse, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    pub fn new(outcomes: Vec<Result<GenerationResponse, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose single call answers with `text`.
    pub fn replying(text: Option<&str>) -> Self {
        Self::new(vec![Ok(response(text))])
    }

    /// A client whose single call fails with `err`.
    pub fn failing(err: ProviderError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl InferenceClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn base_url(&self) -> &str {
        "http://scripted:11434"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut outcomes = self.outcomes.lock().unwrap();
        assert!(
            !outcomes.is_empty(),
            "ScriptedClient: no more outcomes (call #{})",
            self.requests.lock().unwrap().len()
        );
        outcomes.remove(0)
    }
}

/// A finished response carrying `text`.
pub fn response(text: Option<&str>) -> GenerationResponse {
    GenerationResponse {
        text: text.map(str::to_string),
        done: true,
        model: Some("scripted-model".into()),
        ..Default::default()
    }
}
