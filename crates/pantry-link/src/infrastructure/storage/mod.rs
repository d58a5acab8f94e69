//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML settings file from the
//! platform-appropriate directory (or an explicit path), writes it back, and
//! supplies defaults on first run when no file exists yet.

pub mod config;

pub use config::{load_config, load_config_from, save_config, AppConfig, ConfigError};
