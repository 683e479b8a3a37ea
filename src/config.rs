use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::submit::pagerduty::EVENTS_API_BASE;

/// Main relay configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub queue: QueueConfig,
    pub api: ApiConfig,
    pub log_level: LogLevel,
    /// Log file path; `-` logs to stderr
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Directory holding queued events (may contain ~ or $VARS)
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    /// Total time allowed for one submission
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/tmp/pagerduty"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: EVENTS_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check PDRELAY_CONFIG env var
        if let Ok(env_path) = std::env::var("PDRELAY_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from PDRELAY_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try ~/.config/pdrelay/pdrelay.yaml
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("pdrelay").join("pdrelay.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./pdrelay.yaml
        let local_config = PathBuf::from("pdrelay.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded file
    pub fn with_overrides(mut self, queue_dir: Option<PathBuf>, endpoint: Option<String>) -> Self {
        if let Some(dir) = queue_dir {
            self.queue.dir = dir;
        }
        if let Some(endpoint) = endpoint {
            self.api.endpoint = endpoint;
        }
        self
    }

    /// The queue directory with ~ and env vars expanded
    pub fn queue_dir(&self) -> PathBuf {
        Self::expand_path(&self.queue.dir)
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.queue.dir, PathBuf::from("/tmp/pagerduty"));
        assert_eq!(config.api.endpoint, EVENTS_API_BASE);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("queue:\n  dir: /var/spool/pdrelay\nlog_level: debug\n").unwrap();
        assert_eq!(config.queue.dir, PathBuf::from("/var/spool/pdrelay"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.api.endpoint, EVENTS_API_BASE);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("pdrelay.yaml");
        fs::write(&path, "api:\n  endpoint: http://localhost:9000/events\n  timeout_secs: 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.endpoint, "http://localhost:9000/events");
        assert_eq!(config.api.timeout_secs, 3);
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let path = PathBuf::from("/nonexistent/pdrelay.yaml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::default().with_overrides(Some(PathBuf::from("/q")), Some("http://x".to_string()));
        assert_eq!(config.queue.dir, PathBuf::from("/q"));
        assert_eq!(config.api.endpoint, "http://x");
    }

    #[test]
    fn test_expand_path_no_expansion() {
        let path = PathBuf::from("/usr/local/bin");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        // SAFETY: Test runs single-threaded, env var is test-specific
        unsafe {
            std::env::set_var("PDRELAY_TEST_VAR", "/custom/path");
        }
        let path = PathBuf::from("$PDRELAY_TEST_VAR/queue");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/custom/path/queue"));
        unsafe {
            std::env::remove_var("PDRELAY_TEST_VAR");
        }
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let yaml_str = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = serde_yaml::from_str(&yaml_str).expect("Failed to deserialize");
        assert_eq!(parsed.queue.dir, config.queue.dir);
        assert_eq!(parsed.api.timeout_secs, config.api.timeout_secs);
    }
}
