//! Logging
//!
//! `tracing` subscriber setup. Logs go to stderr; stdout is kept for the
//! authorization URL, the approval prompt and upload progress.

use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "MONZO_LOG_FORMAT";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Include the module target.
    pub include_target: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
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

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable.
    Pretty,
    /// One JSON object per line.
    Json,
    /// Single-line human-readable.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Create configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings, with the format taken from `MONZO_LOG_FORMAT` when valid.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(LOG_FORMAT_ENV).ok().map(|v| v.parse::<LogFormat>()) {
            Some(Ok(format)) => config.with_format(format),
            _ => config,
        }
    }

    /// Set the fallback log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set whether to include the module target.
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Filter from `RUST_LOG`, falling back to the configured level.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }

    /// Install the global subscriber. Fails if one is already installed.
    pub fn init(self) -> Result<(), TryInitError> {
        let filter = self.env_filter();
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(self.include_target);

        match self.format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact())
                .try_init(),
        }
    }
}
