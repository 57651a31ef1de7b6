//! Logging setup.
//!
//! Installs a `tracing` subscriber with an `EnvFilter` (`RUST_LOG`
//! overrides the configured default), a stderr layer, and optionally a
//! non-blocking file layer.
//!
//! # Example
//!
//! ```ignore
//! let _guard = geoalarm::logging::init_logging(&LogConfig::default())?;
//! tracing::info!("ready");
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "geoalarm.log";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    /// A global subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

/// Logging options.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_level: String,
    /// Also write to this file (no ANSI colours).
    pub log_file: Option<PathBuf>,
    /// Colour the stderr output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Set the default filter.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    /// Also log to `path`.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Enable or disable ANSI colours on stderr.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }
}

/// Keeps the file writer alive. Dropping it flushes pending log lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Default log file location under the platform data directory.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::config::APP_DIR_NAME)
        .join(DEFAULT_LOG_FILE)
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(config.ansi)
        .with_target(false);

    let (file_layer, file_guard) = match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&directory)?;
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| DEFAULT_LOG_FILE.into());

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
