//! Configuration loading and management for itinera.
//!
//! Loads settings from `itinera.toml` with environment variable overrides for
//! the two API keys. Every section has defaults, so running without a config
//! file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// LLM provider, only "gemini" is wired up
    pub provider: String,
    /// Model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Opening line of every itinerary prompt
    pub persona: String,
    /// Sampling temperature for all model calls
    pub temperature: f32,
}

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap-compatible base URL
    pub base_url: String,
    /// How many days ahead the provider can forecast
    pub forecast_horizon_days: u32,
}

/// Prompt assembly limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Soft ceiling on the composed prompt, in characters
    pub max_chars: usize,
    /// Number of attractions to ask the model for
    pub attraction_count: usize,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
    #[serde(default)]
    pub weather_key: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location (itinera.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        let gemini = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_API_KEY"));
        if let Ok(key) = gemini {
            self.api.gemini_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENWEATHERMAP_API_KEY") {
            self.api.weather_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("itinera.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        dirs::home_dir()
            .map(|home| home.join(".config").join("itinera").join("itinera.toml"))
            .filter(|path| path.exists())
    }

    /// Get the API key for the configured provider
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.agent.provider.as_str() {
            "gemini" => non_empty(self.api.gemini_key.as_deref())
                .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string())),
            other => Err(ConfigError::MissingApiKey(other.to_string())),
        }
    }

    /// Weather key, if any. Absence means weather enrichment is off.
    pub fn weather_key(&self) -> Option<&str> {
        non_empty(self.api.weather_key.as_deref())
    }
}

fn non_empty(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            persona: "As an expert travel planner, create a detailed itinerary based on this request:"
                .to_string(),
            temperature: 0.7,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            forecast_horizon_days: 5,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_chars: 12_000,
            attraction_count: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.agent.provider, "gemini");
        assert_eq!(config.weather.forecast_horizon_days, 5);
        assert_eq!(config.prompt.attraction_count, 5);
        assert!(config.api.gemini_key.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
model = "gemini-2.5-flash"

[prompt]
max_chars = 4000
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.agent.model, "gemini-2.5-flash");
        assert_eq!(config.agent.provider, "gemini");
        assert_eq!(config.prompt.max_chars, 4000);
        assert_eq!(config.prompt.attraction_count, 5);
        assert_eq!(config.weather.forecast_horizon_days, 5);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent\nmodel = ").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let mut config = Config::default();
        config.api.gemini_key = Some("  ".to_string());
        config.api.weather_key = Some(String::new());
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey(_))));
        assert_eq!(config.weather_key(), None);

        config.api.gemini_key = Some("abc".to_string());
        assert_eq!(config.api_key().unwrap(), "abc");
    }

    #[test]
    fn unknown_provider_has_no_key() {
        let mut config = Config::default();
        config.agent.provider = "openai".to_string();
        config.api.gemini_key = Some("abc".to_string());
        assert!(matches!(config.api_key(), Err(ConfigError::MissingApiKey(p)) if p == "openai"));
    }
}
