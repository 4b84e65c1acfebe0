//! Subcommand implementations.

pub mod chat;
pub mod config_cmd;
pub mod doctor;

/// A failure whose details a command has already printed.
///
/// `main` exits nonzero on it without printing anything else.
#[derive(Debug)]
pub struct Reported;

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("failure already reported")
    }
}

impl std::error::Error for Reported {}
