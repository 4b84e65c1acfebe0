//! Turn and Ledger domain types.
//!
//! A [`Ledger`] is the append-only record of one conversation:
//! user types a line → it becomes a [`Turn`] → the ledger is flattened into a
//! prompt → the model's reply becomes the next turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions, always the first turn
    System,
    /// The person at the console
    User,
    /// The model
    Assistant,
}

impl Role {
    /// The speaker label used when flattening a ledger into a prompt.
    pub fn prefix(self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "Human",
            Role::Assistant => "Assistant",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn
    pub role: Role,

    /// The text content (may be empty)
    pub content: String,

    /// When the turn was recorded
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An ordered, append-only conversation history.
///
/// Always starts with exactly one [`Role::System`] turn carrying the system
/// prompt captured at construction. Turns are never reordered, edited, or
/// removed individually; [`Ledger::clear`] is the only way to drop them and
/// it re-seeds the system turn. The ledger keeps its [`ConversationId`]
/// across clears.
#[derive(Debug, Clone)]
pub struct Ledger {
    id: ConversationId,
    system_prompt: String,
    turns: Vec<Turn>,
}

impl Ledger {
    /// Create a ledger seeded with a single system turn.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            id: ConversationId::new(),
            turns: vec![Turn::system(system_prompt.clone())],
            system_prompt,
        }
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// Drop every turn and re-insert the original system turn.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::system(self.system_prompt.clone()));
    }

    /// Iterate the turns oldest first.
    ///
    /// The iterator borrows the ledger, so it always reflects the state at
    /// the time it was obtained. Clone it to walk the history again.
    pub fn history(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// The most recent turn (the system turn on a fresh ledger).
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}
