//! # Application Configuration
//!
//! This module defines the configuration structure for the `medibot-server` and
//! the logic for loading it. Settings are layered, each layer overriding the
//! previous one:
//!
//! 1. Programmatic defaults (Groq chat provider, the summary task prompts, the
//!    local Ollama embedding endpoint, indexing disabled).
//! 2. An optional YAML file with `${VAR}` substitution from the environment.
//! 3. Plain environment variables for top-level keys (`PORT`, `DB_URL`, `UPLOAD_DIR`).
//! 4. `MEDIBOT_`-prefixed variables for nested keys (`MEDIBOT_INDEXING__ENABLED`).

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use medibot::{
    constants::{DEFAULT_DB_FILE, DEFAULT_UPLOAD_DIR},
    ingest::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    prompts::summary::{CONVERSATION_SUMMARY_SYSTEM_PROMPT, CONVERSATION_SUMMARY_USER_PROMPT},
    providers::factory::{EmbeddingConfig, ProviderConfig, OLLAMA_EMBED_URL},
};
use regex::Regex;
use serde::Deserialize;
use std::{collections::HashMap, env, fs, sync::OnceLock};
use tracing::info;

/// The task that drives `POST /medical/summarize`.
pub const CONVERSATION_SUMMARY_TASK: &str = "conversation_summary";

/// The provider the default tasks point at.
pub const DEFAULT_PROVIDER: &str = "groq_default";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// Where uploaded prescriptions are written. Loaded from `UPLOAD_DIR` env var.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Timeout applied to every outbound AI or embedding request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    /// A map of named, reusable AI provider configurations.
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    pub tasks: HashMap<String, TaskConfig>,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_upload_dir() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// HTTP surface settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Request bodies larger than this are rejected with 413.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// The optional chunk-and-embed stage that runs after every upload.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

/// Defines the prompts and provider for a specific application task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("valid pattern"))
}

/// Replaces every `${VAR}` with the value of the environment variable, or an
/// empty string when it is unset.
pub fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            env::var(&caps["var"]).unwrap_or_default()
        })
        .into_owned()
}

// Reads a file and substitutes env vars. Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    Ok(Some(substitute_env_vars(&content)))
}

/// Loads the application configuration.
///
/// With `config_path_override`, that file must exist. Without it, `config.yml`
/// next to this crate is used when present and the defaults otherwise.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let provider_key = format!("providers.{DEFAULT_PROVIDER}");
    let task_key = format!("tasks.{CONVERSATION_SUMMARY_TASK}");

    // Layer 1: Programmatic defaults.
    let mut builder = ConfigBuilder::builder()
        .set_default(format!("{provider_key}.provider"), "groq")?
        .set_default(format!("{provider_key}.model_name"), "deepseek-r1-distill-llama-70b")?
        .set_default(format!("{provider_key}.temperature"), 0.3)?
        .set_default(format!("{task_key}.provider"), DEFAULT_PROVIDER)?
        .set_default(format!("{task_key}.system_prompt"), CONVERSATION_SUMMARY_SYSTEM_PROMPT)?
        .set_default(format!("{task_key}.user_prompt"), CONVERSATION_SUMMARY_USER_PROMPT)?
        .set_default("embedding.api_url", OLLAMA_EMBED_URL)?
        .set_default("embedding.model_name", "llama3.2:1b")?;

    if let Ok(key) = env::var("GROQ_API_KEY") {
        builder = builder.set_default(format!("{provider_key}.api_key"), key)?;
    }

    // Layer 2: The YAML file.
    match config_path_override {
        Some(path) => {
            let content = read_and_substitute(path)?.ok_or_else(|| {
                ConfigError::NotFound(format!("Config file not found at '{path}'."))
            })?;
            info!("Loading configuration from '{path}'.");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            let default_path = format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"));
            match read_and_substitute(&default_path)? {
                Some(content) => {
                    info!("Loading user-defined configuration from '{default_path}'.");
                    builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
                }
                None => info!("'{default_path}' not found. Using built-in defaults."),
            }
        }
    }

    let settings = builder
        // Layer 3: Top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 4: Prefixed variables for nested overrides.
        .add_source(
            Environment::with_prefix("MEDIBOT")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
