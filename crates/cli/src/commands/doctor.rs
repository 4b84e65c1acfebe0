//! `ollachat doctor` — Diagnose configuration and backend health.

use std::sync::Arc;

use ollachat_agent::ChatSession;
use ollachat_config::ChatConfig;
use ollachat_core::InferenceClient;
use ollachat_providers::OllamaClient;

pub async fn run(environment: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let environment = ChatConfig::resolve_environment(environment);

    println!("🩺 ollachat Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let dir = ChatConfig::config_dir();
    for path in [
        ChatConfig::base_path(&dir),
        ChatConfig::environment_path(&dir, &environment),
    ] {
        if path.exists() {
            println!("  ✅ Found {}", path.display());
        } else {
            println!("  ➖ No {} (optional)", path.display());
        }
    }

    let config = match ChatConfig::load(Some(&environment)) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!();
            println!("  ⚠️  Fix the configuration before checking the backend.");
            return Err(super::Reported.into());
        }
    };

    let client = Arc::new(OllamaClient::from_config(&config)?);
    println!(
        "  ➖ Requests to {} give up after {}s",
        client.base_url(),
        client.timeout().as_secs()
    );
    let session = ChatSession::from_config(client, &config);

    if session.test_connection().await {
        println!(
            "  ✅ {} answered with model '{}'",
            config.base_url, config.model_name
        );
    } else {
        println!(
            "  ❌ No answer from {} with model '{}'",
            config.base_url, config.model_name
        );
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found.");
        println!();
        super::chat::print_connection_help(&config.base_url);
    }

    Ok(())
}
