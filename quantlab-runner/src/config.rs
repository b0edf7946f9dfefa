//! Serializable backtest configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quantlab_core::engine::EngineConfig;
use quantlab_core::strategy::StrategySpec;

use crate::metrics::MetricsConfig;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

/// Everything needed to reproduce a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Strategy name and parameters, resolved through the registry.
    pub strategy: StrategySpec,

    /// Optional date window (inclusive on both ends). Omitted bounds
    /// mean "from the start of the series" / "to the end".
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl RunConfig {
    pub fn new(strategy: StrategySpec) -> Self {
        Self {
            strategy,
            start_date: None,
            end_date: None,
            engine: EngineConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId, which makes sweep
    /// results and artifact directories content-addressable.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization cannot fail");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ConfigError::InvertedDateRange { start, end });
            }
        }
        Ok(())
    }
}
