use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Extraction service config
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Result validation thresholds
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Persistence settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Extraction provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionProvider {
    #[default]
    Ollama,
    Anthropic,
}

impl ExtractionProvider {
    /// Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for ExtractionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ExtractionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Provider config with defaults for the given provider
    pub fn new(provider_type: ExtractionProvider) -> Self {
        match provider_type {
            ExtractionProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            ExtractionProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Extraction service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Extraction provider to use
    #[serde(default)]
    pub provider: ExtractionProvider,

    /// Available extraction providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common extraction settings
    #[serde(default)]
    pub common: ExtractionCommonConfig,
}

/// Common extraction settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionCommonConfig {
    /// Temperature parameter for generation; extraction wants deterministic output
    #[serde(default)]
    pub temperature: f32,

    /// Token budget for the whole-document slugline call
    #[serde(default = "default_slugline_max_tokens")]
    pub slugline_max_output_tokens: u32,

    /// Token budget for each per-scene call
    #[serde(default = "default_scene_max_tokens")]
    pub scene_max_output_tokens: u32,

    /// Attempts per extraction call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff for transient failures (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single backoff sleep (in milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Randomize backoff sleeps
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for ExtractionCommonConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            slugline_max_output_tokens: default_slugline_max_tokens(),
            scene_max_output_tokens: default_scene_max_tokens(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter: true,
        }
    }
}

/// Thresholds used by the result validator
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationSettings {
    /// Locations shorter than this (in characters) produce a warning
    #[serde(default = "default_min_location_length")]
    pub min_location_length: usize,

    /// Time-of-day values accepted in addition to the built-in list
    #[serde(default)]
    pub extra_common_times: Vec<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            min_location_length: default_min_location_length(),
            extra_common_times: Vec::new(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// SQLite file; the user data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_slugline_max_tokens() -> u32 {
    8192
}

fn default_scene_max_tokens() -> u32 {
    4096
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8000
}

fn default_min_location_length() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_endpoint() -> String {
    String::new()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write this configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.extraction.provider == ExtractionProvider::Anthropic
            && self.extraction.get_api_key().is_empty()
        {
            return Err(anyhow!("API key is required for Anthropic provider"));
        }

        if self.extraction.common.max_attempts == 0 {
            return Err(anyhow!("extraction.common.max_attempts must be at least 1"));
        }

        Ok(())
    }
}

impl ExtractionConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting defaults if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str);

        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers
                    .push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            ExtractionProvider::Ollama => default_ollama_model(),
            ExtractionProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            ExtractionProvider::Ollama => default_ollama_endpoint(),
            ExtractionProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: ExtractionProvider::default(),
            available_providers: vec![
                ProviderConfig::new(ExtractionProvider::Ollama),
                ProviderConfig::new(ExtractionProvider::Anthropic),
            ],
            common: ExtractionCommonConfig::default(),
        }
    }
}
