//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL of the completion endpoint.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    /// Model identifier sent with every completion request.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Seconds a reply stream may stay silent before it is abandoned.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_concurrent_sessions: usize,
    /// Preview rows captured from each upload and folded into prompts.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Whether model-generated code directives may actually run.
    #[serde(default)]
    pub enable_code_execution: bool,
    /// Interpreter the execution sink pipes code to (when enabled).
    #[serde(default = "default_code_command")]
    pub code_command: PathBuf,
    #[serde(default)]
    pub code_args: Vec<String>,
    /// Seconds an execution may run before it is killed.
    #[serde(default = "default_code_timeout_secs")]
    pub code_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_endpoint_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_stream_idle_timeout_secs() -> u64 {
    120
}

fn default_max_sessions() -> usize {
    10
}

fn default_preview_rows() -> usize {
    5
}

fn default_code_command() -> PathBuf {
    PathBuf::from("python3")
}

fn default_code_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            endpoint_url: default_endpoint_url(),
            default_model: default_model(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
            max_concurrent_sessions: default_max_sessions(),
            preview_rows: default_preview_rows(),
            enable_code_execution: false,
            code_command: default_code_command(),
            code_args: Vec::new(),
            code_timeout_secs: default_code_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}
