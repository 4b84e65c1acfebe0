//! Inference backend clients for ollachat.
//!
//! All clients implement the `ollachat_core::InferenceClient` trait.

pub mod ollama;

pub use ollama::OllamaClient;
