//! Configuration management for the dashboard.
//!
//! Loads configuration from ${DASHBOARD_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the API base URL.
pub const API_BASE_URL_ENV: &str = "DASHBOARD_API_BASE_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for dashboard configuration and data directories.
    //!
    //! DASHBOARD_HOME resolution order:
    //! 1. DASHBOARD_HOME environment variable (if set)
    //! 2. ~/.config/dashboard (default)

    use std::path::PathBuf;

    /// Returns the dashboard home directory.
    ///
    /// Falls back to `./.dashboard` when no home directory can be determined.
    pub fn dashboard_home() -> PathBuf {
        if let Ok(home) = std::env::var("DASHBOARD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".dashboard"),
            |h| h.join(".config").join("dashboard"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        dashboard_home().join("config.toml")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        dashboard_home().join("logs")
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the records API.
    pub base_url: Option<String>,
    /// Request timeout in seconds (0 disables).
    pub timeout_secs: u32,
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
    const DEFAULT_TIMEOUT_SECS: u32 = 10;

    /// Resolves the base URL. Empty or whitespace values are treated as unset.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(Self::DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.timeout_secs)))
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Some(Self::DEFAULT_BASE_URL.to_string()),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// File log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `dashboard_core=debug`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies `DASHBOARD_API_BASE_URL` when set to a non-blank value.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV)
            && !url.trim().is_empty()
        {
            self.api.base_url = Some(url.trim().to_string());
        }
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.api.base_url.as_deref(),
            Some(ApiConfig::DEFAULT_BASE_URL)
        );
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "[api]\ntimeout_secs = 3\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.timeout_secs, 3);
        assert_eq!(
            config.api.base_url.as_deref(),
            Some(ApiConfig::DEFAULT_BASE_URL)
        );
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# Dashboard Configuration"));
        assert!(contents.contains("jsonplaceholder.typicode.com"));

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_zero_disables() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(api.timeout(), None);
    }

    /// Base URL: empty/whitespace treated as unset.
    #[test]
    fn test_blank_base_url_falls_back_to_default() {
        let api = ApiConfig {
            base_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(api.effective_base_url(), ApiConfig::DEFAULT_BASE_URL);

        let api = ApiConfig {
            base_url: Some("http://localhost:9000".to_string()),
            ..Default::default()
        };
        assert_eq!(api.effective_base_url(), "http://localhost:9000");
    }
}
