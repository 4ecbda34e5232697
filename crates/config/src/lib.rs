//! Configuration loading, validation, and management for ReelPrompt.
//!
//! Loads configuration from `~/.reelprompt/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use reelprompt_core::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.reelprompt/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation endpoint
    #[serde(default)]
    pub llm: LlmConfig,

    /// Character knowledge base source
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    /// Composition pipeline behavior
    #[serde(default)]
    pub composer: ComposerConfig,

    /// Image captioning service
    #[serde(default)]
    pub captioning: CaptioningConfig,

    /// Preview image stub
    #[serde(default)]
    pub preview: PreviewConfig,

    /// HTTP API
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer key; LM Studio ignores it, hosted endpoints need it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:1234/v1".into()
}
fn default_model() -> String {
    "local-model".into()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LlmConfig {
    /// Per-call options for the text-generation port.
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_traits_path")]
    pub path: PathBuf,
}

fn default_traits_path() -> PathBuf {
    PathBuf::from("data/character_traits.json")
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: default_traits_path(),
        }
    }
}

/// What the composer does when a generation step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Write the `Error:` sentinel into the field and keep going.
    #[default]
    Propagate,
    /// Abort the composition at the first failed step.
    ShortCircuit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposerConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Issue independent DAG branches concurrently
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptioningConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Vision endpoint; falls back to `llm.base_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Default task token, e.g. `<MORE_DETAILED_CAPTION>`
    #[serde(default = "default_caption_task")]
    pub task: String,

    #[serde(default = "default_caption_max_tokens")]
    pub max_tokens: u32,
}

fn default_caption_task() -> String {
    "<MORE_DETAILED_CAPTION>".into()
}
fn default_caption_max_tokens() -> u32 {
    1024
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            model: default_model(),
            task: default_caption_task(),
            max_tokens: default_caption_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_placeholder_path")]
    pub placeholder_path: PathBuf,
}

fn default_placeholder_path() -> PathBuf {
    PathBuf::from("static/preview.jpg")
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            placeholder_path: default_placeholder_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    7860
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.reelprompt/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `REELPROMPT_LLM_URL`
    /// - `REELPROMPT_MODEL`
    /// - `REELPROMPT_API_KEY`
    /// - `REELPROMPT_TRAITS_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load `path`, then apply environment overrides and re-validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("REELPROMPT_LLM_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("REELPROMPT_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = lookup("REELPROMPT_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(path) = lookup("REELPROMPT_TRAITS_PATH") {
            self.knowledge_base.path = PathBuf::from(path);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".reelprompt")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tokens must be > 0".into(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_secs must be > 0".into(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.base_url must not be empty".into(),
            ));
        }
        if self.captioning.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "captioning.max_tokens must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// The endpoint the captioner should talk to.
    pub fn captioning_base_url(&self) -> &str {
        self.captioning
            .base_url
            .as_deref()
            .unwrap_or(&self.llm.base_url)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
