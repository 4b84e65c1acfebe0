//! Configuration loading, validation, and management for ollachat.
//!
//! Settings are resolved from several layers, highest priority first:
//!
//! 1. Environment variables (`OLLAMA_MODEL`, `OLLAMA_URL`, ...)
//! 2. `~/.ollachat/config.{environment}.toml`
//! 3. `~/.ollachat/config.toml`
//! 4. Built-in defaults
//!
//! The merged result is validated once; the chat session treats it as an
//! immutable snapshot.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_BASE_URL: &str = "OLLAMA_URL";
pub const ENV_TIMEOUT_MINUTES: &str = "OLLAMA_TIMEOUT_MINUTES";
pub const ENV_TEMPERATURE: &str = "CHAT_TEMPERATURE";
pub const ENV_TOP_P: &str = "CHAT_TOP_P";
pub const ENV_SYSTEM_PROMPT: &str = "CHAT_SYSTEM_PROMPT";

/// Selects the environment-specific config file.
pub const ENV_ENVIRONMENT: &str = "OLLACHAT_ENV";
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Upper bound for `request_timeout_minutes` (one week).
pub const MAX_TIMEOUT_MINUTES: i64 = 7 * 24 * 60;

/// The chat configuration.
///
/// Maps directly to `~/.ollachat/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model to generate with
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Root URL of the Ollama server (no `/api` suffix)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single generation call
    #[serde(default = "default_timeout_minutes")]
    pub request_timeout_minutes: i64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Seeded as the first turn of every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_model_name() -> String {
    "deepseek-r1:7b-qwen-distill-q8_0".into()
}
fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_timeout_minutes() -> i64 {
    2
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_p() -> f64 {
    0.9
}
fn default_system_prompt() -> String {
    "You are a helpful and friendly AI assistant. You maintain context from our conversation \
     and provide thoughtful, relevant responses."
        .into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            base_url: default_base_url(),
            request_timeout_minutes: default_timeout_minutes(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from the default directory and the process environment.
    ///
    /// `environment` picks the overlay file; when `None` it comes from
    /// `OLLACHAT_ENV`, falling back to `production`.
    pub fn load(environment: Option<&str>) -> Result<Self, ConfigError> {
        let environment = Self::resolve_environment(environment);
        Self::load_layered(&Self::config_dir(), &environment, |key| std::env::var(key).ok())
    }

    /// Load every layer from `dir`, reading variables through `lookup`.
    pub fn load_layered(
        dir: &Path,
        environment: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut merged = read_table(&Self::base_path(dir))?.unwrap_or_default();
        if let Some(overlay) = read_table(&Self::environment_path(dir, environment))? {
            merge_tables(&mut merged, overlay);
        }

        let mut config: Self =
            toml::Value::Table(merged)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::ParseError {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                })?;

        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file, without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = match read_table(path)? {
            Some(table) => toml::Value::Table(table).try_into().map_err(
                |e: toml::de::Error| ConfigError::ParseError {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            )?,
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// Unset or empty variables are skipped. Numeric values that fail to
    /// parse are skipped with a warning, leaving the lower layer in place.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(model) = get(ENV_MODEL) {
            self.model_name = model;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = get(ENV_TIMEOUT_MINUTES) {
            match raw.trim().parse() {
                Ok(minutes) => self.request_timeout_minutes = minutes,
                Err(_) => tracing::warn!(var = ENV_TIMEOUT_MINUTES, value = %raw, "Ignoring non-integer value"),
            }
        }
        if let Some(raw) = get(ENV_TEMPERATURE) {
            match raw.trim().parse() {
                Ok(t) => self.temperature = t,
                Err(_) => tracing::warn!(var = ENV_TEMPERATURE, value = %raw, "Ignoring non-numeric value"),
            }
        }
        if let Some(raw) = get(ENV_TOP_P) {
            match raw.trim().parse() {
                Ok(p) => self.top_p = p,
                Err(_) => tracing::warn!(var = ENV_TOP_P, value = %raw, "Ignoring non-numeric value"),
            }
        }
        if let Some(prompt) = get(ENV_SYSTEM_PROMPT) {
            self.system_prompt = prompt;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model_name cannot be empty".into(),
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url cannot be empty".into(),
            ));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "base_url must be a valid absolute URL, got '{}'",
                self.base_url
            )));
        }

        if !(1..=MAX_TIMEOUT_MINUTES).contains(&self.request_timeout_minutes) {
            return Err(ConfigError::ValidationError(format!(
                "request_timeout_minutes must be between 1 and {MAX_TIMEOUT_MINUTES}"
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::ValidationError(
                "top_p must be between 0.0 and 1.0".into(),
            ));
        }

        if self.system_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "system_prompt cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// The per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        let minutes = u64::try_from(self.request_timeout_minutes).unwrap_or(0);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ollachat")
    }

    /// `config.toml` inside `dir`.
    pub fn base_path(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// `config.{environment}.toml` inside `dir`.
    pub fn environment_path(dir: &Path, environment: &str) -> PathBuf {
        dir.join(format!("config.{environment}.toml"))
    }

    /// The environment name used to pick the overlay file.
    pub fn resolve_environment(explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(ENV_ENVIRONMENT).ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    /// Every layer in priority order (highest first), for display.
    pub fn sources(environment: &str) -> Vec<String> {
        let dir = Self::config_dir();
        vec![
            format!(
                "Environment variables ({ENV_MODEL}, {ENV_BASE_URL}, {ENV_TIMEOUT_MINUTES}, \
                 {ENV_TEMPERATURE}, {ENV_TOP_P}, {ENV_SYSTEM_PROMPT})"
            ),
            "`.env` file in the working directory (only fills unset variables)".to_string(),
            Self::environment_path(&dir, environment).display().to_string(),
            Self::base_path(&dir).display().to_string(),
            "Built-in defaults".to_string(),
        ]
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Generate a sample `.env` file.
    pub fn sample_env() -> String {
        let d = Self::default();
        format!(
            "# Ollama\n\
             {ENV_MODEL}={}\n\
             {ENV_BASE_URL}={}\n\
             {ENV_TIMEOUT_MINUTES}={}\n\
             \n\
             # Chat\n\
             {ENV_TEMPERATURE}={}\n\
             {ENV_TOP_P}={}\n\
             {ENV_SYSTEM_PROMPT}=You are a helpful AI assistant.\n",
            d.model_name, d.base_url, d.request_timeout_minutes, d.temperature, d.top_p,
        )
    }
}

/// Read a TOML file into a table. A missing file is `Ok(None)`.
fn read_table(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config file at {}, skipping", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let table = toml::from_str(&content).map_err(|e: toml::de::Error| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!("Loaded config layer {}", path.display());
    Ok(Some(table))
}

/// Merge `overlay` into `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
