//! # ollachat core
//!
//! Domain types, traits, and error definitions for the ollachat conversation
//! engine. This crate has **no I/O of its own** — it defines the model that
//! the provider, agent, and CLI crates implement against.
//!
//! - [`message`] — turns, roles, and the append-only conversation ledger
//! - [`provider`] — the generation wire types and the [`InferenceClient`] trait
//! - [`error`] — client-level and domain-level error taxonomies

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result};
pub use message::{ConversationId, Ledger, Role, Turn};
pub use provider::{GenerationOptions, GenerationRequest, GenerationResponse, InferenceClient};
