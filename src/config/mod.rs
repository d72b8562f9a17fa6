use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;
use vidstream_api::ClientConfig;
use vidstream_api::client::{BASE_URL_ENV, DEFAULT_API_PATH, DEFAULT_INSTANCE_URL};

const CONFIG_DIR_NAME: &str = ".vidstream";
const CONFIG_FILE_NAME: &str = "config.json";
const SESSION_FILE_NAME: &str = "session.json";

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Application settings persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instance origin
    pub api_base_url: String,
    /// Path prefix of every endpoint
    pub api_path: String,
    pub request_timeout_secs: u64,
    /// Lifetime of cached lookups
    pub cache_ttl_secs: u64,
    pub log_level: LogLevel,
    pub log_to_file: bool,
    /// Rotated log files to keep
    pub log_max_files: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_INSTANCE_URL.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            request_timeout_secs: 30,
            cache_ttl_secs: 300,
            log_level: LogLevel::Info,
            log_to_file: true,
            log_max_files: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Load configuration, falling back to defaults when the file is missing
    /// or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(target: "config", path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                tracing::info!(target: "config", path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(target: "config", path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty JSON, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Apply `VIDSTREAM_API_BASE_URL`, if set
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    /// The override is a complete API base, so the path prefix is dropped
    fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
            self.api_path = String::new();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_base_url.clone())
            .with_api_path(self.api_path.clone())
            .with_timeout(self.request_timeout())
    }
}

static CONFIG_MANAGER: OnceLock<Arc<ConfigManager>> = OnceLock::new();

/// Owns the configuration file and the settings read from it
pub struct ConfigManager {
    path: PathBuf,
    config: RwLock<AppConfig>,
}

impl ConfigManager {
    /// `~/.vidstream`
    pub fn get_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn get_log_dir() -> PathBuf {
        Self::get_config_dir().join("logs")
    }

    /// Read the configuration at `path`; a missing file yields defaults
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = AppConfig::load_or_default(&path);
        Self {
            path,
            config: RwLock::new(config),
        }
    }

    /// Install the process-wide manager backed by `~/.vidstream/config.json`
    pub fn init() -> Result<Arc<ConfigManager>> {
        Self::init_with_path(Self::get_config_path())
    }

    /// Install the process-wide manager backed by the given file
    pub fn init_with_path(path: impl Into<PathBuf>) -> Result<Arc<ConfigManager>> {
        let manager = Arc::new(Self::load(path));
        CONFIG_MANAGER
            .set(manager.clone())
            .map_err(|_| anyhow!("Configuration manager already initialized"))?;
        Ok(manager)
    }

    /// The process-wide manager, if [`ConfigManager::init`] has run
    pub fn try_get() -> Option<Arc<ConfigManager>> {
        CONFIG_MANAGER.get().cloned()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Session file stored next to the configuration file
    pub fn session_path(&self) -> PathBuf {
        self.path
            .parent()
            .map(|dir| dir.join(SESSION_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(SESSION_FILE_NAME))
    }

    /// Effective configuration, environment overrides applied
    pub fn get_config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .with_env_overrides()
    }

    /// Change the stored configuration and persist it
    pub fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let snapshot = {
            let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
            change(&mut config);
            config.clone()
        };
        snapshot.save_to_file(&self.path)?;
        tracing::info!(target: "config", path = %self.path.display(), "Saved config file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url":"https://v.example.com","log_level":"debug"}"#)
            .unwrap();

        let config = AppConfig::load_or_default(&path);
        assert_eq!(config.api_base_url, "https://v.example.com");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.api_path, "/api");
        assert_eq!(config.cache_ttl_secs, 300);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn base_url_override_replaces_api_prefix() {
        let config = AppConfig::default()
            .with_base_url_override(Some("https://v.example.com/api/v2".to_string()));
        assert_eq!(
            config.client_config().endpoint_url("/videos"),
            "https://v.example.com/api/v2/videos"
        );

        let untouched = AppConfig::default().with_base_url_override(Some("  ".to_string()));
        assert_eq!(untouched, AppConfig::default());
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let manager = ConfigManager::load(&path);

        manager
            .update(|config| {
                config.log_to_file = false;
                config.cache_ttl_secs = 60;
            })
            .unwrap();

        let reloaded = AppConfig::load_from_file(&path).unwrap();
        assert!(!reloaded.log_to_file);
        assert_eq!(reloaded.cache_ttl_secs, 60);
        assert_eq!(manager.session_path(), dir.path().join("nested").join("session.json"));
    }
}
