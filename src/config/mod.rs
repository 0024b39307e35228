//! Configuration management for moltpulse.
//!
//! Configuration is read from `~/.config/moltpulse/config.toml` at startup
//! (or the path given with `--config`). If the file doesn't exist, a default
//! configuration with comments is created. A few environment variables
//! override the file: `PORT`, `REDIS_URL` and `VERCEL`.

use crate::scraper::ScraperConfig;
use crate::store::StoreConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub scraper: ScraperConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Crawl interval for `serve`, e.g. "1d" or "6h"; empty disables it
    pub crawl_interval: String,
    /// Crawl once as soon as the server starts
    pub crawl_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            crawl_interval: "1d".to_string(),
            crawl_on_start: false,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, creating it with defaults when missing.
    /// Environment overrides are applied on top.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let mut config = if config_path.exists() {
            Self::parse_file(config_path)?
        } else {
            Self::create_default_config(config_path)?;
            Self::default()
        };

        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn parse_file(config_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/moltpulse/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("moltpulse").join("config.toml"))
    }

    /// Apply `PORT`, `REDIS_URL` and `VERCEL` overrides read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    key: "PORT",
                    value: port.clone(),
                })?;
        }

        if let Some(url) = lookup("REDIS_URL").filter(|u| !u.trim().is_empty()) {
            self.store.redis_url = Some(url);
        }

        // Serverless hosts ship no Chromium
        if lookup("VERCEL").as_deref() == Some("1") {
            self.scraper.use_browser = false;
        }

        Ok(())
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    pub fn default_config_content() -> String {
        r##"# moltpulse configuration
#
# Environment variables take precedence:
#   PORT       overrides server.port
#   REDIS_URL  overrides store.redis_url
#   VERCEL=1   disables the headless browser tier

[server]
host = "0.0.0.0"
port = 3001

# How often `moltpulse serve` crawls ("30m", "6h", "1d", or seconds).
# Leave empty to crawl only on POST /api/crawl.
crawl_interval = "1d"

# Crawl once as soon as the server starts
crawl_on_start = false

[store]
# Redis connection; without it reports live in memory only
# redis_url = "redis://127.0.0.1:6379"

# Give up connecting to Redis after this many milliseconds
connect_timeout_ms = 5000

# Drop the oldest week of reports once Redis uses this many bytes (29 MiB)
prune_threshold_bytes = 30408704
prune_days = 7

[scraper]
base_url = "https://www.moltbook.com"

# Try a headless Chromium before falling back to plain HTTP
use_browser = true
headless = true

# Browser timings
nav_timeout_secs = 25
wait_after_nav_ms = 6000
selector_timeout_secs = 20
wait_after_top_click_ms = 2500
request_delay_ms = 1500

# Plain HTTP fallback timeout
http_timeout_secs = 15

# Also collect the board list from /m
crawl_submolts = true

# CSS selectors for post links (in priority order)
post_link_selectors = [
    "a[href*=\"/post/\"]",
    "a[href*=\"post/\"]",
    "[href*=\"/post/\"]",
]

max_embedded_posts = 50
max_regex_posts = 30

# Disable image loading in the browser
block_images = true
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.crawl_interval, "1d");
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.scraper.post_link_selectors.len(), 3);
        assert!(config.scraper.use_browser);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[server]
port = 8080

[scraper]
use_browser = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom values
        assert_eq!(config.server.port, 8080);
        assert!(!config.scraper.use_browser);
        // Default values
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.scraper.nav_timeout_secs, 25);
        assert_eq!(config.store.prune_days, 7);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.server.address(), "0.0.0.0:3001");
        assert!(config.store.redis_url.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[
                ("PORT", "4000"),
                ("REDIS_URL", "redis://cache:6379"),
                ("VERCEL", "1"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://cache:6379"));
        assert!(!config.scraper.use_browser);
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = Config::default();
        let err = config.apply_env_from(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "PORT", .. }));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.scraper.base_url, "https://www.moltbook.com");

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[store]"));
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
