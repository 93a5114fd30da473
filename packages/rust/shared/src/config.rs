//! Application configuration for the curriculum builder.
//!
//! User config lives at `~/.curriculum/curriculum.toml`.
//! CLI flags override config file values, which override defaults.
//! The file names environment variables for credentials; it never stores
//! the credentials themselves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CurriculumError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "curriculum.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".curriculum";

// ---------------------------------------------------------------------------
// Config structs (matching curriculum.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Reasoning-service settings.
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Issue-tracker settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Labels applied to published issues.
    #[serde(default)]
    pub labels: LabelsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum number of subtopics per topic.
    #[serde(default = "default_subtopic_cap")]
    pub subtopic_cap: usize,

    /// Per-call timeout for every external request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fence language for starter code that is not already fenced.
    #[serde(default = "default_code_language")]
    pub code_language: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            subtopic_cap: default_subtopic_cap(),
            timeout_secs: default_timeout_secs(),
            code_language: default_code_language(),
        }
    }
}

impl DefaultsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_subtopic_cap() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_code_language() -> String {
    "python".into()
}

/// `[reasoning]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Name of the env var that may override `base_url`.
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,

    /// OpenAI-compatible endpoint used when the env override is unset.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url_env: default_base_url_env(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url_env() -> String {
    "OPENAI_BASE_URL".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "openai/gpt-5-mini".into()
}

/// `[tracker]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Name of the env var holding the tracker token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            api_base: default_api_base(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}

/// `[labels]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_topic_labels")]
    pub topic: Vec<String>,

    #[serde(default = "default_subtopic_labels")]
    pub subtopic: Vec<String>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            topic: default_topic_labels(),
            subtopic: default_subtopic_labels(),
        }
    }
}

fn default_topic_labels() -> Vec<String> {
    vec!["learning".into()]
}
fn default_subtopic_labels() -> Vec<String> {
    vec!["learning".into(), "subtopic".into()]
}

// ---------------------------------------------------------------------------
// Resolved runtime settings (config + environment)
// ---------------------------------------------------------------------------

/// Reasoning-service connection settings with the credential resolved.
#[derive(Clone)]
pub struct ReasoningSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ReasoningSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Tracker connection settings with the token resolved.
#[derive(Clone)]
pub struct TrackerSettings {
    pub token: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for TrackerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerSettings")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolve the reasoning-service credential and endpoint from the environment.
pub fn resolve_reasoning_settings(config: &AppConfig) -> Result<ReasoningSettings> {
    let var_name = &config.reasoning.api_key_env;
    let api_key = non_empty_env(var_name).ok_or_else(|| {
        CurriculumError::config(format!(
            "reasoning service API key not found. Set the {var_name} environment variable."
        ))
    })?;

    let base_url = non_empty_env(&config.reasoning.base_url_env)
        .unwrap_or_else(|| config.reasoning.base_url.clone());

    Ok(ReasoningSettings {
        api_key,
        base_url,
        model: config.reasoning.model.clone(),
        timeout: config.defaults.timeout(),
    })
}

/// Resolve the tracker token from the environment.
///
/// Only called when issues will actually be created.
pub fn resolve_tracker_settings(config: &AppConfig) -> Result<TrackerSettings> {
    let var_name = &config.tracker.token_env;
    let token = non_empty_env(var_name).ok_or_else(|| {
        CurriculumError::config(format!(
            "tracker token not found. Set the {var_name} environment variable to create issues."
        ))
    })?;

    Ok(TrackerSettings {
        token,
        api_base: config.tracker.api_base.clone(),
        timeout: config.defaults.timeout(),
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.curriculum/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CurriculumError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.curriculum/curriculum.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CurriculumError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CurriculumError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CurriculumError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CurriculumError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CurriculumError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
