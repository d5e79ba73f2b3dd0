//! Configuration management for dcvcheck
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, an optional TOML file, environment variables and
//! command-line flags.

use crate::cli::Cli;
use crate::validation::DEFAULT_CNAME_SUFFIX;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("workers must be at least 1")]
    NoWorkers,

    #[error("performance.queue_capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("validation.cname_suffix must not be empty")]
    EmptySuffix,
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Number of concurrent DNS workers.
    pub workers: usize,
    /// Input file with one record per line; standard input when unset.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// Queue sizing.
    pub performance: PerformanceConfig,
    /// Configuration for DNS queries.
    pub dns: DnsConfig,
    /// Configuration for the validation policy.
    pub validation: ValidationConfig,
    /// Configuration for the result stream.
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PerformanceConfig {
    /// Capacity of the input queue. The producer waits when it is full.
    pub queue_capacity: usize,
}

/// Configuration for DNS queries.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DnsConfig {
    /// `host`, `host:port` or `system`.
    pub resolver: String,
    /// Per-query timeout in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Domain the expected CNAME target sits under.
    pub cname_suffix: String,
}

/// The format for result lines.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    PlainText,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("Json"),
            OutputFormat::PlainText => f.write_str("PlainText"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Config {
    /// Loads the configuration, layering sources from lowest to highest
    /// precedence: defaults, the TOML file named by `--config`, `DCVCHECK_`
    /// environment variables, then command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            // e.g. DCVCHECK_WORKERS=20 or DCVCHECK_DNS__RESOLVER=1.1.1.1
            .merge(Env::prefixed("DCVCHECK_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.performance.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.validation.cname_suffix.trim_matches('.').is_empty() {
            return Err(ConfigError::EmptySuffix);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            workers: 10,
            input: None,
            performance: PerformanceConfig {
                queue_capacity: 1024,
            },
            dns: DnsConfig {
                resolver: "8.8.8.8".to_string(),
                timeout_ms: 2000,
            },
            validation: ValidationConfig {
                cname_suffix: DEFAULT_CNAME_SUFFIX.to_string(),
            },
            output: OutputConfig::default(),
        }
    }
}
