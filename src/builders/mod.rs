//! Builders
//!
//! Fluent builders for configuration.

pub mod config;

pub use config::{monzo_config, MonzoConfigBuilder};
