//! ollachat CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive chat or single-message mode (default)
//! - `doctor`  — Diagnose configuration and backend connectivity
//! - `config`  — Inspect configuration and print sample files

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ollachat",
    about = "ollachat — contextual chat with a local Ollama model",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration environment (selects `config.<ENV>.toml`)
    #[arg(long = "env", global = true, env = "OLLACHAT_ENV")]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Diagnose configuration and backend connectivity
    Doctor,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective (merged and validated) configuration
    Show,

    /// Print the base config file path
    Path,

    /// List configuration sources in priority order
    Sources,

    /// Print a sample config file
    Sample {
        /// Print a sample `.env` file instead of TOML
        #[arg(long)]
        dotenv: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Fills only variables that are not already set, so real environment
    // variables keep priority over the file.
    let dotenv_path = dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing; stderr keeps logs out of the chat transcript
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(message) = failure_message(e.as_ref()) {
                eprintln!("Error: {message}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let environment = cli.environment.as_deref();

    match cli.command.unwrap_or(Commands::Chat { message: None }) {
        Commands::Chat { message } => commands::chat::run(environment, message).await?,
        Commands::Doctor => commands::doctor::run(environment).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(environment)?,
            ConfigAction::Path => commands::config_cmd::path()?,
            ConfigAction::Sources => commands::config_cmd::sources(environment)?,
            ConfigAction::Sample { dotenv } => commands::config_cmd::sample(dotenv)?,
        },
    }

    Ok(())
}

/// What to print for a failed command; `None` when the command already
/// told the user.
fn failure_message(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    if err.is::<commands::Reported>() {
        None
    } else {
        Some(err.to_string())
    }
}
