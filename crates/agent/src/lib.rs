//! The conversation engine — the heart of ollachat.
//!
//! Each call to [`ChatSession::ask`] runs one fixed cycle:
//!
//! 1. **Record** the user's text as a turn in the ledger
//! 2. **Flatten** the whole ledger into a single prompt ([`prompt::render`])
//! 3. **Generate** through the configured inference client
//! 4. **Record** the (trimmed) reply as an assistant turn and return it
//!
//! There is no loop and no retry: one user turn, one backend call.

pub mod prompt;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use prompt::render;
pub use session::{ChatSession, FALLBACK_REPLY};
