use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    provider::{geobytes::DEFAULT_NEARBY_URL, openweather::DEFAULT_WEATHER_URL},
    retry::RetryPolicy,
};

/// OpenWeather credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    pub api_key: Option<String>,
    pub url: String,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self { api_key: None, url: DEFAULT_WEATHER_URL.to_string() }
    }
}

/// GeoBytes nearby-cities endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoBytesConfig {
    pub url: String,
    /// Search radius in miles.
    pub radius: u32,
}

impl Default for GeoBytesConfig {
    fn default() -> Self {
        Self { url: DEFAULT_NEARBY_URL.to_string(), radius: 100 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
///
/// [retry]
/// max_retries = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub openweather: OpenWeatherConfig,
    pub geobytes: GeoBytesConfig,
    pub retry: RetryPolicy,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    /// Returns the OpenWeather API key, if a non-blank one is present.
    pub fn api_key(&self) -> Option<&str> {
        self.openweather.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }

    /// Like [`Config::api_key`], but a missing key is an error with a hint.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `cityweather --configure` or set OPENWEATHER_API_KEY."
            )
        })
    }
}
