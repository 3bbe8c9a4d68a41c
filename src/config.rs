//! Runtime configuration for the matching service.
//!
//! Loaded with the following precedence (lowest to highest):
//! 1) Built-in defaults
//! 2) Optional JSON config file (if present)
//! 3) Environment variables prefixed with `ORDERBOOK_`, nested sections
//!    separated by `__` (e.g. `ORDERBOOK_METRICS__LISTEN_ADDR`)

use figment::{
    providers::{Env, Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Address the Prometheus exporter listens on
    pub listen_addr: SocketAddr,
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
            report_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instrument label used in logs and metrics
    pub symbol: String,
    /// Value of one price tick, for display only
    pub tick_size: f64,
    /// Capacity of the engine's command queue
    pub command_buffer: usize,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub metrics: MetricsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "DEFAULT".to_string(),
            tick_size: 0.01,
            command_buffer: 1024,
            log_filter: "info".to_string(),
            metrics: MetricsConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Figment(Box<figment::Error>),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Figment(e) => write!(f, "Could not load config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Figment(Box::new(e))
    }
}

impl EngineConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));

        if let Some(path) = config_path.filter(|path| path.exists()) {
            figment = figment.merge(Json::file(path));
        }
        figment = figment.merge(Env::prefixed("ORDERBOOK_").split("__"));

        let config: EngineConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_size > 0.0) {
            return Err(ConfigError::Invalid("tick_size must be positive".to_string()));
        }
        if self.command_buffer == 0 {
            return Err(ConfigError::Invalid(
                "command_buffer must be at least 1".to_string(),
            ));
        }
        if self.metrics.report_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "metrics.report_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
