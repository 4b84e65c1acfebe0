//! `ollachat config` — Configuration inspection commands.

use ollachat_config::ChatConfig;

pub fn show(environment: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::load(environment).map_err(|e| format!("Failed to load config: {e}"))?;
    print_summary(&config);
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", ChatConfig::base_path(&ChatConfig::config_dir()).display());
    Ok(())
}

pub fn sources(environment: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let environment = ChatConfig::resolve_environment(environment);
    print_sources(&environment);
    Ok(())
}

pub fn sample(dotenv: bool) -> Result<(), Box<dyn std::error::Error>> {
    if dotenv {
        print!("{}", ChatConfig::sample_env());
    } else {
        print!("{}", ChatConfig::default_toml());
    }
    Ok(())
}

/// Print the effective settings, one per line.
pub fn print_summary(config: &ChatConfig) {
    println!("  Model:          {}", config.model_name);
    println!("  Base URL:       {}", config.base_url);
    println!("  Timeout:        {} minute(s)", config.request_timeout_minutes);
    println!("  Temperature:    {}", config.temperature);
    println!("  Top P:          {}", config.top_p);
    println!("  System prompt:  {}", truncate(&config.system_prompt, 50));
}

/// Print every configuration layer, highest priority first.
pub fn print_sources(environment: &str) {
    println!("  Configuration sources (highest priority first):");
    for (rank, source) in ChatConfig::sources(environment).iter().enumerate() {
        println!("    {}. {source}", rank + 1);
    }
}

/// Shorten `text` to at most `max` characters, ending in `...` when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
