use std::str::FromStr;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::error::{SyncError, SyncResult};

static LOGGING: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(SyncError::config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Build the filter for the given level; `RUST_LOG` directives take precedence
pub fn env_filter(level: LogLevel) -> EnvFilter {
    let level: Level = level.into();
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Initialize the logging system. Later calls are no-ops.
pub fn init_logging(level: LogLevel, format: LogFormat) -> SyncResult<()> {
    LOGGING
        .get_or_try_init(|| {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stderr)
                .with_target(true);

            let result = match format {
                LogFormat::Pretty => builder
                    .with_ansi(true)
                    .with_span_events(FmtSpan::NONE)
                    .try_init(),
                LogFormat::Json => builder
                    .with_thread_ids(true)
                    .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                    .json()
                    .flatten_event(true)
                    .try_init(),
            };

            result.map_err(|e| SyncError::config(format!("Failed to initialize logging: {}", e)))
        })
        .map(|_| ())
}
