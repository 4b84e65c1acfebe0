//! The chat session: one ledger, one inference client, one call per question.

use std::sync::Arc;

use ollachat_config::ChatConfig;
use ollachat_core::error::{Error, ProviderError, Result};
use ollachat_core::message::{ConversationId, Ledger, Turn};
use ollachat_core::provider::{GenerationRequest, InferenceClient};
use tracing::{debug, info, warn};

use crate::prompt;

/// Recorded and returned when the backend answers with no text.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response.";

/// Drives a single conversation against an inference backend.
///
/// The session owns its [`Ledger`]; the client is shared and stateless, so
/// independent sessions may point at the same client. `ask` takes
/// `&mut self`, which keeps calls on one session strictly sequential.
pub struct ChatSession {
    /// The backend to generate with
    client: Arc<dyn InferenceClient>,

    /// The model to request
    model: String,

    /// Sampling temperature
    temperature: f64,

    /// Nucleus sampling threshold
    top_p: f64,

    /// Conversation history
    ledger: Ledger,
}

impl ChatSession {
    /// Create a session seeded with `system_prompt`.
    pub fn new(
        client: Arc<dyn InferenceClient>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.7,
            top_p: 0.9,
            ledger: Ledger::new(system_prompt),
        }
    }

    /// Create a session from validated configuration.
    pub fn from_config(client: Arc<dyn InferenceClient>, config: &ChatConfig) -> Self {
        Self::new(client, &config.model_name, &config.system_prompt)
            .with_temperature(config.temperature)
            .with_top_p(config.top_p)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Send `user_text` and return the assistant's reply.
    ///
    /// The user turn is recorded before the backend is called and stays in
    /// the ledger even if the call fails. The assistant turn is recorded only
    /// on success.
    pub async fn ask(&mut self, user_text: impl Into<String>) -> Result<String> {
        self.ledger.append_user(user_text);

        let request = GenerationRequest::new(&self.model, prompt::render(&self.ledger))
            .with_options(self.temperature, self.top_p);

        debug!(
            conversation = %self.ledger.id(),
            turns = self.ledger.history().len(),
            model = %self.model,
            "Asking model"
        );

        let response = match self.client.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(conversation = %self.ledger.id(), error = %e, "Generation failed");
                return Err(self.translate(e));
            }
        };

        let reply = response
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(FALLBACK_REPLY)
            .to_string();

        self.ledger.append_assistant(reply.clone());
        Ok(reply)
    }

    /// Map a client failure onto the domain taxonomy.
    fn translate(&self, err: ProviderError) -> Error {
        match err {
            ProviderError::Transport(_) => Error::BackendUnavailable {
                base_url: self.client.base_url().to_string(),
                source: err,
            },
            ProviderError::Timeout(_) => Error::RequestTimedOut { source: err },
            ProviderError::Protocol { .. } | ProviderError::InvalidResponse(_) => {
                Error::UnexpectedFailure { source: err }
            }
        }
    }

    /// Forget the conversation, keeping only the system prompt.
    pub fn clear_history(&mut self) {
        self.ledger.clear();
        info!(conversation = %self.ledger.id(), "History cleared");
    }

    /// The conversation so far, oldest first, starting with the system turn.
    pub fn history(&self) -> std::slice::Iter<'_, Turn> {
        self.ledger.history()
    }

    /// Check that the backend can generate with the configured model.
    pub async fn test_connection(&self) -> bool {
        self.client.probe(&self.model).await
    }

    pub fn conversation_id(&self) -> &ConversationId {
        self.ledger.id()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedClient, response};
    use ollachat_core::message::Role;

    fn session(client: Arc<ScriptedClient>) -> ChatSession {
        ChatSession::new(client, "llama3.2", "You are terse.")
    }

    #[tokio::test]
    async fn reply_is_trimmed_and_recorded() {
        let client = Arc::new(ScriptedClient::replying(Some("  hello  ")));
        let mut chat = session(client.clone());

        let reply = chat.ask("hi").await.unwrap();
        assert_eq!(reply, "hello");

        let turns: Vec<&Turn> = chat.history().collect();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].content, "hi");
        assert_eq!(turns[2].role, Role::Assistant);
        assert_eq!(turns[2].content, "hello");
    }

    #[tokio::test]
    async fn request_carries_flattened_prompt_and_settings() {
        let client = Arc::new(ScriptedClient::replying(Some("ok")));
        let mut chat = session(client.clone()).with_temperature(0.2).with_top_p(0.5);

        chat.ask("hi").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "llama3.2");
        assert_eq!(req.prompt, "System: You are terse.\nHuman: hi\nAssistant:\n");
        assert!(!req.stream);
        let options = req.options.unwrap();
        assert!((options.temperature - 0.2).abs() < f64::EPSILON);
        assert!((options.top_p - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn second_question_sees_first_exchange() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(response(Some("Paris."))),
            Ok(response(Some("About 2 million."))),
        ]));
        let mut chat = session(client.clone());

        chat.ask("Capital of France?").await.unwrap();
        chat.ask("Population?").await.unwrap();

        let requests = client.requests();
        assert_eq!(
            requests[1].prompt,
            "System: You are terse.\nHuman: Capital of France?\nAssistant: Paris.\n\
             Human: Population?\nAssistant:\n"
        );
        assert_eq!(chat.history().len(), 5);
    }

    #[tokio::test]
    async fn null_text_falls_back() {
        let client = Arc::new(ScriptedClient::replying(None));
        let mut chat = session(client);

        let reply = chat.ask("hi").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(chat.history().last().unwrap().content, FALLBACK_REPLY);
        assert_eq!(chat.history().last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn whitespace_only_text_falls_back() {
        let client = Arc::new(ScriptedClient::replying(Some(" \n\t ")));
        let mut chat = session(client);
        assert_eq!(chat.ask("hi").await.unwrap(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn transport_failure_is_backend_unavailable() {
        let client = Arc::new(ScriptedClient::failing(ProviderError::Transport(
            "connection refused".into(),
        )));
        let mut chat = session(client);

        let err = chat.ask("hi").await.unwrap_err();
        match &err {
            Error::BackendUnavailable { base_url, .. } => {
                assert_eq!(base_url, "http://scripted:11434");
            }
            other => panic!("expected BackendUnavailable, got {other:?}"),
        }
        assert!(matches!(err.provider_error(), ProviderError::Transport(_)));

        // The user turn survives; no assistant turn was added.
        let turns: Vec<&Turn> = chat.history().collect();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].content, "hi");
    }

    #[tokio::test]
    async fn timeout_is_request_timed_out() {
        let client = Arc::new(ScriptedClient::failing(ProviderError::Timeout(
            "after 120s".into(),
        )));
        let mut chat = session(client);

        let err = chat.ask("hi").await.unwrap_err();
        assert!(matches!(err, Error::RequestTimedOut { .. }), "got {err:?}");
        assert_eq!(chat.history().len(), 2);
    }

    #[tokio::test]
    async fn protocol_failures_are_unexpected() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(ProviderError::Protocol {
                status_code: 500,
                reason: "Internal Server Error".into(),
                body: "out of memory".into(),
            }),
            Err(ProviderError::InvalidResponse("expected value".into())),
        ]));
        let mut chat = session(client);

        let first = chat.ask("one").await.unwrap_err();
        assert!(matches!(first, Error::UnexpectedFailure { .. }));
        assert!(first.to_string().contains("out of memory"));

        let second = chat.ask("two").await.unwrap_err();
        assert!(matches!(second, Error::UnexpectedFailure { .. }));

        // Both user turns recorded, in order.
        let contents: Vec<&str> = chat.history().skip(1).map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn session_recovers_after_failure() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(ProviderError::Transport("refused".into())),
            Ok(response(Some("back online"))),
        ]));
        let mut chat = session(client.clone());

        assert!(chat.ask("first").await.is_err());
        assert_eq!(chat.ask("second").await.unwrap(), "back online");

        // The retried call still carries the unanswered first question.
        assert_eq!(
            client.requests()[1].prompt,
            "System: You are terse.\nHuman: first\nHuman: second\nAssistant:\n"
        );
    }

    #[tokio::test]
    async fn clear_history_keeps_system_prompt_and_identity() {
        let client = Arc::new(ScriptedClient::replying(Some("hello")));
        let mut chat = session(client);
        let id = chat.conversation_id().clone();

        chat.ask("hi").await.unwrap();
        chat.clear_history();

        let turns: Vec<&Turn> = chat.history().collect();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].content, "You are terse.");
        assert_eq!(chat.conversation_id(), &id);
    }

    #[tokio::test]
    async fn test_connection_reports_probe_result() {
        let healthy = ChatSession::new(
            Arc::new(ScriptedClient::replying(Some("Hi"))),
            "llama3.2",
            "sys",
        );
        assert!(healthy.test_connection().await);

        let empty = ChatSession::new(Arc::new(ScriptedClient::replying(Some(""))), "llama3.2", "sys");
        assert!(!empty.test_connection().await);

        let down = ChatSession::new(
            Arc::new(ScriptedClient::failing(ProviderError::Transport("refused".into()))),
            "llama3.2",
            "sys",
        );
        assert!(!down.test_connection().await);
    }

    #[tokio::test]
    async fn test_connection_does_not_touch_history() {
        let client = Arc::new(ScriptedClient::replying(Some("Hi")));
        let chat = session(client.clone());
        chat.test_connection().await;
        assert_eq!(chat.history().len(), 1);
        assert_eq!(client.requests()[0].prompt, "Hello");
        assert_eq!(client.requests()[0].model, "llama3.2");
    }

    #[test]
    fn from_config_copies_settings() {
        let config = ChatConfig {
            model_name: "mistral".into(),
            temperature: 1.5,
            top_p: 0.25,
            system_prompt: "Pirate voice.".into(),
            ..ChatConfig::default()
        };
        let chat = ChatSession::from_config(Arc::new(ScriptedClient::new(vec![])), &config);
        assert_eq!(chat.model(), "mistral");
        assert!((chat.temperature - 1.5).abs() < f64::EPSILON);
        assert!((chat.top_p - 0.25).abs() < f64::EPSILON);
        assert_eq!(chat.history().next().unwrap().content, "Pirate voice.");
        assert_eq!(chat.base_url(), "http://scripted:11434");
    }
}
