//! Configuration management for linkfetcher
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use linkfetcher::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Workers: {}", config.engine.workers);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `LINKFETCHER__<section>__<key>`:
//! - `LINKFETCHER__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `LINKFETCHER__ENGINE__WORKERS=16`
//! - `LINKFETCHER__ENGINE__REQUEST_TIMEOUT_SECS=30`
//!
//! # Configuration File
//!
//! Read from `config/linkfetcher.toml` unless `LINKFETCHER_CONFIG` points
//! elsewhere. A missing file is not an error.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{ApiLimits, Config, EngineSettings, ServerConfig};
pub use validation::{MAX_PAYLOAD_CEILING, ValidationError};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path (plus environment overrides)
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
