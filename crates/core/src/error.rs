//! Error types for the ollachat domain.
//!
//! Two layers, each translated exactly once:
//! - [`ProviderError`] is raised by an [`InferenceClient`](crate::InferenceClient)
//!   and describes what went wrong on the wire.
//! - [`Error`] is raised by the chat session and describes what it means for
//!   the conversation. Every variant keeps the originating `ProviderError` as
//!   its `source()`.

use thiserror::Error;

/// Domain-level failures surfaced to whoever drives a chat session.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Failed to connect to Ollama. Please ensure Ollama is running locally on {base_url}"
    )]
    BackendUnavailable {
        base_url: String,
        #[source]
        source: ProviderError,
    },

    #[error("Request timed out. The model might be taking too long to respond.")]
    RequestTimedOut {
        #[source]
        source: ProviderError,
    },

    #[error("Error getting response from chatbot: {source}")]
    UnexpectedFailure {
        #[source]
        source: ProviderError,
    },
}

impl Error {
    /// The client error this domain error was translated from.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            Error::BackendUnavailable { source, .. }
            | Error::RequestTimedOut { source }
            | Error::UnexpectedFailure { source } => source,
        }
    }

    /// Whether the backend could not be reached at all.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Error::BackendUnavailable { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by an inference client.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The request never produced a response (refused, DNS, reset).
    #[error("Network error: {0}")]
    Transport(String),

    /// The configured request timeout elapsed.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status.
    #[error("Ollama API returned {status_code} {reason}. Error: {body}")]
    Protocol {
        status_code: u16,
        reason: String,
        body: String,
    },

    /// The backend answered 2xx but the body was not a generation response.
    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),
}
