//! Logging configuration and initialization
//!
//! Console output is compact text or JSON; an optional log file receives the
//! same events without ANSI colours through a non-blocking writer.
//!
//! # Environment Variables
//!
//! - `SYNCWALL_LOG`: filter directives (e.g. "debug", "info,syncwall::control=trace")
//! - `SYNCWALL_LOG_FORMAT`: "json" or "text", overrides the configured format

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "SYNCWALL_LOG";
/// Format override variable
pub const LOG_FORMAT_ENV: &str = "SYNCWALL_LOG_FORMAT";

/// Keeps the file writer flushing; drop it last
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

/// Console line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Format from an environment override, falling back to `configured`
    pub fn resolve(env_value: Option<&str>, configured: LogFormat) -> LogFormat {
        match env_value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "text" => LogFormat::Text,
            _ => configured,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log to stderr (default: true)
    pub console_enabled: bool,
    /// Also log to this file (default: none)
    pub file_path: Option<PathBuf>,
    /// Console format (default: text)
    pub format: LogFormat,
    /// Filter used when no environment filter is set (default: "info")
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_path: None,
            format: LogFormat::Text,
            default_level: "info".to_string(),
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("syncwall.log"));
    (dir, file)
}

/// Install the global subscriber.
///
/// Returns the file writer guard when file logging is enabled; keep it alive
/// for the lifetime of the program.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let format = LogFormat::resolve(std::env::var(LOG_FORMAT_ENV).ok().as_deref(), config.format);

    let (file_layer, guard) = match &config.file_path {
        Some(path) => {
            let (dir, file) = split_log_path(path);
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_enabled = config.console_enabled;
    let text_layer = (console_enabled && format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
    });
    let json_layer = (console_enabled && format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter(&config.default_level))
        .with(file_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()?;

    tracing::info!(
        target: "syncwall",
        version = env!("CARGO_PKG_VERSION"),
        json = format == LogFormat::Json,
        file = ?config.file_path,
        "Logging initialized"
    );

    Ok(guard)
}
