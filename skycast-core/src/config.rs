use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::dispatch::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Which calendar day a 3-hour sample belongs to when synthesizing daily data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// The calling machine's local time zone.
    #[default]
    Local,
    /// The forecast location's UTC offset as reported by the provider.
    Location,
}

/// Client configuration, read from `config.toml`.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// cache_ttl_secs = 600
/// day_boundary = "location"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub geocode_ttl_secs: u64,
    pub day_boundary: DayBoundary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: 600,
            geocode_ttl_secs: 86_400,
            day_boundary: DayBoundary::Local,
        }
    }
}

impl Config {
    /// Load config from the platform config dir (defaults if missing),
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let cfg = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };

        Ok(cfg.with_env_overrides(|name| std::env::var(name).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(contents)?;
        ttl_from_secs(cfg.cache_ttl_secs).context("cache_ttl_secs is out of range")?;
        ttl_from_secs(cfg.geocode_ttl_secs).context("geocode_ttl_secs is out of range")?;
        Ok(cfg)
    }

    /// Apply overrides from an environment lookup (`std::env::var` in production).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        self
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The configured API key, or an error with a hint on how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: set {API_KEY_ENV} or add `api_key = \"...\"` to the config file."
                )
            })
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Default cache TTL; saturates for values no file load would accept.
    pub fn cache_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.cache_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn geocode_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.geocode_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }
}

fn ttl_from_secs(secs: u64) -> Result<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| anyhow!("{secs}s does not fit in a duration"))
}
