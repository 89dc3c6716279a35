//! Telemetry
//!
//! Structured logging via `tracing`.

pub mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig, TryInitError, LOG_FORMAT_ENV};
