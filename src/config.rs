//! Configuration loading and management for lectio.
//!
//! Loads settings from `lectio.toml` with environment variable overrides for
//! the API keys. Every section has defaults, so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::generator::{FieldPolicy, RetryPolicy};

/// Explicit config path override
pub const ENV_CONFIG_PATH: &str = "LECTIO_CONFIG";
/// Comma-separated key list; replaces `[api].gemini_keys`
pub const ENV_GEMINI_KEYS: &str = "GEMINI_API_KEYS";
/// Single key, appended to the pool
pub const ENV_GEMINI_KEY: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which generator implementation to wire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    /// Offline generator that mirrors the source texts
    Demo,
}

/// Readings feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    /// Calendar region path segment, e.g. "United.States"
    pub region: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://universalis.com".to_string(),
            region: "United.States".to_string(),
            timeout_secs: 30,
        }
    }
}

/// LLM generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: Provider,
    /// Model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
    pub base_url: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub attempt_timeout_secs: u64,
    pub field_policy: FieldPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_attempts: 3,
            base_delay_ms: 1000,
            attempt_timeout_secs: 60,
            field_policy: FieldPolicy::Lenient,
        }
    }
}

impl GeneratorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
        }
    }
}

/// API keys configuration (usually loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_keys: Vec<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location (lectio.toml in cwd or home).
    ///
    /// Falls back to defaults plus environment keys when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file()? {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text without touching the environment
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override API keys from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(keys) = std::env::var(ENV_GEMINI_KEYS) {
            let keys = split_keys(&keys);
            if !keys.is_empty() {
                self.api.gemini_keys = keys;
            }
        }
        if let Ok(key) = std::env::var(ENV_GEMINI_KEY) {
            let key = key.trim().to_string();
            if !key.is_empty() && !self.api.gemini_keys.contains(&key) {
                self.api.gemini_keys.push(key);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.max_attempts < 2 {
            return Err(ConfigError::Invalid(format!(
                "generator.max_attempts must be at least 2, got {}",
                self.generator.max_attempts
            )));
        }
        if self.feed.base_url.trim().is_empty() || self.generator.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Result<Option<PathBuf>, ConfigError> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::Invalid(format!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        // Check current directory first
        let local_config = PathBuf::from("lectio.toml");
        if local_config.exists() {
            return Ok(Some(local_config));
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("lectio").join("lectio.toml");
            if home_config.exists() {
                return Ok(Some(home_config));
            }
        }

        Ok(None)
    }

    /// Get the API keys for the configured provider
    pub fn api_keys(&self) -> Result<&[String], ConfigError> {
        match self.generator.provider {
            Provider::Gemini if self.api.gemini_keys.is_empty() => {
                Err(ConfigError::MissingApiKey("gemini".to_string()))
            }
            _ => Ok(&self.api.gemini_keys),
        }
    }
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        env::remove_var(ENV_GEMINI_KEYS);
        env::remove_var(ENV_GEMINI_KEY);
        env::remove_var(ENV_CONFIG_PATH);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[generator]
model = "gemini-2.5-flash"
max_attempts = 5
"#,
        )
        .unwrap();
        assert_eq!(config.generator.model, "gemini-2.5-flash");
        assert_eq!(config.generator.max_attempts, 5);
        assert_eq!(config.generator.base_delay_ms, 1000);
        assert_eq!(config.feed.region, "United.States");
        assert_eq!(config.generator.provider, Provider::Gemini);
        assert_eq!(config.generator.field_policy, FieldPolicy::Lenient);
    }

    #[test]
    fn provider_and_policy_parse_lowercase() {
        let config = Config::from_toml(
            r#"
[generator]
provider = "demo"
field_policy = "strict"
"#,
        )
        .unwrap();
        assert_eq!(config.generator.provider, Provider::Demo);
        assert_eq!(config.generator.field_policy, FieldPolicy::Strict);
        // demo needs no keys
        assert!(config.api_keys().unwrap().is_empty());
    }

    #[test]
    fn rejects_single_attempt() {
        let config = Config::from_toml("[generator]\nmax_attempts = 1\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn retry_policy_from_config() {
        let policy = GeneratorConfig::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.attempt_timeout, Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn env_keys_override_file_keys() {
        clear_env();
        let mut config = Config::from_toml("[api]\ngemini_keys = [\"file-key\"]\n").unwrap();
        env::set_var(ENV_GEMINI_KEYS, " k1, k2 ,,");
        env::set_var(ENV_GEMINI_KEY, "k2");
        config.apply_env();
        clear_env();
        assert_eq!(config.api.gemini_keys, vec!["k1".to_string(), "k2".to_string()]);
    }

    #[test]
    #[serial]
    fn single_env_key_is_appended() {
        clear_env();
        let mut config = Config::from_toml("[api]\ngemini_keys = [\"file-key\"]\n").unwrap();
        env::set_var(ENV_GEMINI_KEY, "env-key");
        config.apply_env();
        clear_env();
        assert_eq!(
            config.api.gemini_keys,
            vec!["file-key".to_string(), "env-key".to_string()]
        );
    }

    #[test]
    #[serial]
    fn missing_keys_for_gemini() {
        clear_env();
        let mut config = Config::default();
        config.apply_env();
        assert!(matches!(config.api_keys(), Err(ConfigError::MissingApiKey(p)) if p == "gemini"));
    }

    #[test]
    #[serial]
    fn load_from_reads_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lectio.toml");
        std::fs::write(&path, "[feed]\nregion = \"Canada\"\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, path.display().to_string());
        let config = Config::load();
        clear_env();
        assert_eq!(config.unwrap().feed.region, "Canada");
    }

    #[test]
    #[serial]
    fn config_env_pointing_nowhere_is_error() {
        clear_env();
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/lectio.toml");
        let result = Config::load();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
