//! CLI channel — interactive terminal-based chat.
//!
//! Reads lines from stdin, recognises console commands, and forwards
//! everything else as a chat message. Used by `ollachat chat`.

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Words that end the session.
pub const EXIT_COMMANDS: &[&str] = &["quit", "exit", "bye"];

/// One parsed line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Text to send to the model
    Message(String),
    /// Forget the conversation
    Clear,
    /// Show the conversation so far
    History,
    /// Show configuration details
    Config,
    /// Show the command list
    Help,
    /// End the session
    Exit,
}

impl ConsoleInput {
    /// Parse a raw line. Blank lines yield `None`.
    ///
    /// Command keywords match case-insensitively and only when they make up
    /// the whole (trimmed) line; anything else is a message.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let keyword = line.to_lowercase();
        let input = if EXIT_COMMANDS.contains(&keyword.as_str()) {
            ConsoleInput::Exit
        } else {
            match keyword.as_str() {
                "clear" => ConsoleInput::Clear,
                "history" => ConsoleInput::History,
                "config" => ConsoleInput::Config,
                "help" => ConsoleInput::Help,
                _ => ConsoleInput::Message(line.to_string()),
            }
        };
        Some(input)
    }
}

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    buffer: usize,
}

impl CliChannel {
    pub fn new() -> Self {
        Self { buffer: 32 }
    }

    /// Start reading stdin on a background task.
    pub fn start(&self) -> mpsc::Receiver<io::Result<ConsoleInput>> {
        self.start_with(BufReader::new(io::stdin()))
    }

    /// Start reading from any buffered reader.
    ///
    /// The stream ends after [`ConsoleInput::Exit`], at EOF, or after the
    /// first read error (which is delivered).
    pub fn start_with<R>(&self, reader: R) -> mpsc::Receiver<io::Result<ConsoleInput>>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.buffer);

        tokio::spawn(async move {
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(input) = ConsoleInput::parse(&line) else {
                            continue;
                        };
                        let exit = input == ConsoleInput::Exit;

                        if tx.send(Ok(input)).await.is_err() || exit {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Console input closed");
                        break;
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        rx
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}
