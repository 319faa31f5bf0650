use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::workout::WorkoutSettings;

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV: &str = "AI_TRAINER_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Root of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_true")]
    pub sound: bool,

    #[serde(default = "default_effort_delay")]
    pub effort_advance_delay_ms: u64,

    /// Keep skipped exercises in history as zero-set entries
    #[serde(default)]
    pub record_skipped_exercises: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_weight_unit")]
    pub weight_unit: String,

    #[serde(default = "default_date_format")]
    pub date_format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "AI_TRAINER_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_effort_delay() -> u64 {
    1000
}

fn default_weight_unit() -> String {
    "lbs".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            sound: default_true(),
            effort_advance_delay_ms: default_effort_delay(),
            record_skipped_exercises: false,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            weight_unit: default_weight_unit(),
            date_format: default_date_format(),
        }
    }
}

impl AiConfig {
    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl WorkoutConfig {
    pub fn settings(&self) -> WorkoutSettings {
        WorkoutSettings {
            effort_advance_delay_ms: self.effort_advance_delay_ms,
            keep_skipped: self.record_skipped_exercises,
        }
    }
}

impl Config {
    /// Get config directory path (~/.ai-trainer/)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".ai-trainer"))
    }

    /// Config file path: `AI_TRAINER_CONFIG` if set, else ~/.ai-trainer/config.toml
    pub fn config_file() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Log file used while the workout screen owns the terminal
    pub fn log_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("ai-trainer.log"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }
}
