use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Environment variable holding the OpenWeather API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Environment variable overriding the provider base URL.
pub const BASE_URL_ENV: &str = "WEATHER_BASE_URL";

/// Per-endpoint request timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub current_secs: u64,
    pub forecast_secs: u64,
    pub coordinates_secs: u64,
    pub historical_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            current_secs: 5,
            forecast_secs: 6,
            coordinates_secs: 6,
            historical_secs: 8,
        }
    }
}

/// Where the web server listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// history_pause_ms = 200
///
/// [server]
/// port = 8080
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key. `OPENWEATHER_API_KEY` wins over the file.
    pub api_key: Option<String>,

    /// Provider root, e.g. `https://api.openweathermap.org`.
    pub base_url: String,

    /// Prefix for weather icons; `<icon>@2x.png` is appended.
    pub icon_base_url: String,

    pub timeouts: Timeouts,

    /// Pause between consecutive historical calls.
    pub history_pause_ms: u64,

    pub server: ServerConfig,

    /// Directory served under `/bgimg/`.
    pub bgimg_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org".to_string(),
            icon_base_url: "https://openweathermap.org/img/wn/".to_string(),
            timeouts: Timeouts::default(),
            history_pause_ms: 200,
            server: ServerConfig::default(),
            bgimg_dir: PathBuf::from("Bgimg"),
        }
    }
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from an explicit path, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-web")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values found through `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    /// API key to send upstream. Missing keys become empty so the provider
    /// rejects the call instead of the server refusing to start.
    pub fn api_key_or_empty(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn history_pause(&self) -> Duration {
        Duration::from_millis(self.history_pause_ms)
    }
}
