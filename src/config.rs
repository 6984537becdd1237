use crate::analytics::AnalyticsConfig;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SPC / capability analysis settings
    #[serde(default)]
    pub analysis: AnalyticsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Measurement store configuration
    pub state: StateConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration layering the embedded defaults, `path` and the environment
    pub fn load_from(path: &str) -> std::result::Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with environment variables (prefix: DICD_SPC_)
            .add_source(
                config::Environment::with_prefix("DICD_SPC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;

        if self.state.backend == StateBackend::Snapshot && self.state.snapshot_path.is_none() {
            return Err(AppError::Configuration(
                "Snapshot backend requires 'snapshot_path' configuration".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalyticsConfig::default(),
            observability: ObservabilityConfig::default(),
            state: StateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StateBackend,

    /// JSON snapshot of measurements and specs (snapshot backend)
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    /// Empty in-memory store
    #[default]
    Memory,
    /// In-memory store seeded from a JSON snapshot
    Snapshot,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "dicd-spc".to_string()
}
