//! Ledger flattening.
//!
//! The generate endpoint takes one prompt string, so the conversation is
//! rendered as a transcript with one speaker-labelled line per turn, followed
//! by an empty `Assistant:` line that cues the model to answer next:
//!
//! ```text
//! System: You are a helpful assistant.
//! Human: What is Rust?
//! Assistant: A systems programming language.
//! Human: Who made it?
//! Assistant:
//! ```

use std::fmt::Write as _;

use ollachat_core::message::Ledger;

/// The final line of every rendered prompt.
pub const ASSISTANT_CUE: &str = "Assistant:\n";

/// Render `ledger` into a single prompt. Pure: same ledger, same string.
pub fn render(ledger: &Ledger) -> String {
    let mut prompt = String::new();
    for turn in ledger.history() {
        // Infallible: writing into a String.
        let _ = writeln!(prompt, "{}: {}", turn.role.prefix(), turn.content);
    }
    prompt.push_str(ASSISTANT_CUE);
    prompt
}
