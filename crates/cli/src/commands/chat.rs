//! `ollachat chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use ollachat_agent::ChatSession;
use ollachat_channels::{CliChannel, ConsoleInput};
use ollachat_config::{ChatConfig, ENV_MODEL};
use ollachat_core::Role;
use ollachat_providers::OllamaClient;

use super::{Reported, config_cmd};

pub async fn run(
    environment: Option<&str>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match ChatConfig::load(environment) {
        Ok(config) => config,
        Err(e) => {
            eprintln!();
            eprintln!("  ❌ Configuration error: {e}");
            eprintln!();
            eprintln!("  Check your settings in:");
            eprintln!(
                "    {}",
                ChatConfig::base_path(&ChatConfig::config_dir()).display()
            );
            eprintln!("  or run `ollachat config sources` to see every layer.");
            eprintln!();
            return Err(Reported.into());
        }
    };

    let client = Arc::new(OllamaClient::from_config(&config)?);
    let mut session = ChatSession::from_config(client, &config);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = session.ask(msg).await;
        eprint!("\r              \r");

        return match result {
            Ok(reply) => {
                println!("{reply}");
                Ok(())
            }
            Err(e) => {
                eprintln!("  ❌ Error: {e}");
                if e.is_backend_unavailable() {
                    eprintln!();
                    print_connection_help(&config.base_url);
                }
                Err(Reported.into())
            }
        };
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       🤖 ollachat — Interactive Mode         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    config_cmd::print_summary(&config);
    println!();
    print_commands();
    println!("  {}", "-".repeat(50));

    print!("  Testing connection to Ollama... ");
    std::io::stdout().flush()?;
    if !session.test_connection().await {
        println!("❌ Connection failed!");
        print_connection_help(&config.base_url);
        return Err(Reported.into());
    }
    println!("✅ Connected!");
    println!();
    println!("  You can start chatting now!");
    println!();

    let channel = CliChannel::new();
    let mut rx = channel.start();

    prompt()?;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(ConsoleInput::Exit) => break,
            Ok(ConsoleInput::Clear) => {
                session.clear_history();
                println!("  🧹 Conversation history cleared.");
                println!();
            }
            Ok(ConsoleInput::History) => print_history(&session),
            Ok(ConsoleInput::Config) => {
                println!("  📋 Configuration Information:");
                config_cmd::print_sources(&ChatConfig::resolve_environment(environment));
                println!("  To modify settings, you can:");
                println!("    • Edit config.toml or config.<ENV>.toml in {}", ChatConfig::config_dir().display());
                println!("    • Set environment variables ({ENV_MODEL}, OLLAMA_URL, etc.)");
                println!("    • Create a .env file in the working directory");
                println!();
            }
            Ok(ConsoleInput::Help) => {
                println!("  🤖 ollachat Help:");
                println!();
                print_commands();
                println!();
            }
            Ok(ConsoleInput::Message(text)) => {
                eprint!("  ...");
                let result = session.ask(text).await;
                eprint!("\r     \r");

                match result {
                    Ok(reply) => {
                        println!();
                        for line in reply.lines() {
                            println!("  Bot > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        println!("  ❌ Error: {e}");
                        println!();
                        if e.is_backend_unavailable() {
                            print_connection_help(&config.base_url);
                            println!();
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("  [Console Error] {e}");
                break;
            }
        }

        prompt()?;
    }

    println!();
    println!("  👋 Goodbye! Thanks for chatting!");
    println!();

    Ok(())
}

/// Advice shown whenever the backend cannot be reached.
pub fn print_connection_help(base_url: &str) {
    println!("  Please make sure Ollama is running on {base_url}");
    println!("  You can start Ollama by running: ollama serve");
    println!("  💡 Tips:");
    println!("    • Check available models: ollama list");
    println!("    • Pull a model: ollama pull <model-name>");
    println!("    • Set {ENV_MODEL} to change the model");
}

fn print_commands() {
    println!("  Commands:");
    println!("    • Type any message to chat with the bot");
    println!("    • 'quit', 'exit', or 'bye' - End the conversation");
    println!("    • 'clear'   - Clear conversation history");
    println!("    • 'history' - View conversation history");
    println!("    • 'config'  - Show configuration sources");
    println!("    • 'help'    - Show this help message");
}

fn print_history(session: &ChatSession) {
    println!("  📜 Conversation History ({}):", session.conversation_id());
    for turn in session.history().filter(|t| t.role != Role::System) {
        let icon = if turn.role == Role::User { "👤" } else { "🤖" };
        println!(
            "  {icon} {}: {}",
            turn.role.as_str().to_uppercase(),
            turn.content
        );
    }
    println!();
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
