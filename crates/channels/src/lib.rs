//! Chat channel implementations for ollachat.
//!
//! Only the interactive console exists: lines come in from stdin, get parsed
//! into [`ConsoleInput`], and are handed to the chat loop over an mpsc channel.

pub mod cli;

pub use cli::{CliChannel, ConsoleInput};
