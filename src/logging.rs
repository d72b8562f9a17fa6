use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ConfigManager;

const FILE_PREFIX: &str = "vidstream";

/// Configuration for the logging system
pub struct LogConfig {
    /// Directory where log files will be stored
    pub log_dir: PathBuf,
    /// Prefix for log file names
    pub file_prefix: String,
    /// Maximum number of log files to keep (rotation)
    pub max_files: usize,
    /// Whether to write logs to file
    pub log_to_file: bool,
    /// Log level filter string
    pub log_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: ConfigManager::get_log_dir(),
            file_prefix: FILE_PREFIX.to_string(),
            max_files: 5,
            log_to_file: true,
            log_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Create LogConfig from ConfigManager settings
    pub fn from_config_manager() -> Self {
        if let Some(config_manager) = ConfigManager::try_get() {
            let config = config_manager.get_config();
            Self {
                log_dir: ConfigManager::get_log_dir(),
                file_prefix: FILE_PREFIX.to_string(),
                max_files: config.log_max_files,
                log_to_file: config.log_to_file,
                log_level: config.log_level.as_str().to_string(),
            }
        } else {
            Self::default()
        }
    }
}

/// Initialize the logging system with stdout and optional file output
///
/// # Log Targets
/// - `api::client` - Requests, responses and 401 handling
/// - `api::token` - Token storage and refresh
/// - `api::retry` - Retry attempts
/// - `api::cache` - Cache hits, misses and clears
/// - `api::batch` - Batch progress and failures
/// - `api::upload` - File uploads
/// - `api::auth`, `api::vip` - Session and order changes
/// - `config` - Configuration loading and saving
/// - `session` - Token file access
/// - `events` - Event broadcasting
/// - `main` - Application lifecycle
///
/// # Example
/// ```bash
/// # Debug output for the HTTP layer only
/// RUST_LOG=info,api::client=debug vidstream whoami
/// ```
pub fn init_logging(config: LogConfig) -> Result<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Separate branches because the layered subscriber types differ
    let worker_guard = if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

        let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.max_files)
            .build(&config.log_dir)
            .context("Failed to create file appender")?;

        let (non_blocking_file, worker_guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .compact()
            .with_writer(non_blocking_file)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

        let stdout_layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stdout_layer)
            .try_init()
            .context("Failed to install log subscriber")?;

        Some(worker_guard)
    } else {
        let stdout_layer = fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .try_init()
            .context("Failed to install log subscriber")?;

        None
    };

    tracing::debug!(
        target: "main",
        log_dir = %config.log_dir.display(),
        max_files = config.max_files,
        log_to_file = config.log_to_file,
        log_level = %config.log_level,
        "Logging system initialized"
    );

    Ok(LogGuard {
        _worker_guard: worker_guard,
    })
}

/// Flushes buffered file logs when dropped; hold it for the process lifetime.
/// Holds no writer when logging to the terminal only.
pub struct LogGuard {
    _worker_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        tracing::debug!(target: "main", "Flushing logs before shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_config() {
        let config = LogConfig::default();
        assert_eq!(config.file_prefix, "vidstream");
        assert_eq!(config.max_files, 5);
        assert!(config.log_to_file);
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.ends_with("logs"));
    }

    #[test]
    fn terminal_only_logging_holds_no_file_writer() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init_logging(LogConfig {
            log_dir: dir.path().join("logs"),
            log_to_file: false,
            ..LogConfig::default()
        })
        .unwrap();

        assert!(guard._worker_guard.is_none());
        assert!(!dir.path().join("logs").exists());
    }
}
