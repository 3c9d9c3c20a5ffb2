//! Pipeline settings

use crate::error::PipelineError;
use config::{Config, Environment, File};
use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use timeline::TimelineGrid;
use tracing::debug;

/// Config file read when no path is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "sensor-pipeline.toml";

/// Prefix of environment overrides, e.g. `SENSOR_PIPELINE__TIMELINE__GRANULARITY_SECS=5`
pub const ENV_PREFIX: &str = "SENSOR_PIPELINE";

/// Timeline grid settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Seconds between grid slots (60 for `HH:MM` keys, finer for `HH:MM:SS`)
    pub granularity_secs: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { granularity_secs: 60 }
    }
}

/// Which coarser datasets to produce
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub minute: bool,
    pub hour: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            minute: true,
            hour: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned for sensor files
    pub input_dir: PathBuf,
    /// Directory receiving the JSON outputs
    pub output_dir: PathBuf,
    /// Stem suffix stripped to obtain the sensor id, e.g. `SENSOR01_DIRTY.CSV`
    pub file_suffix: String,
    /// Input file extension, matched case-insensitively
    pub file_extension: String,
    pub timeline: TimelineConfig,
    pub validation: ValidationConfig,
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
            file_suffix: "_DIRTY".to_string(),
            file_extension: "csv".to_string(),
            timeline: TimelineConfig::default(),
            validation: ValidationConfig::default(),
            aggregation: AggregationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then the optional TOML file, then environment overrides
    pub fn load(path: Option<&str>) -> Result<Self, PipelineError> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    /// Load with an explicit environment source
    ///
    /// Environment values stay strings; typed fields are parsed on deserialization
    /// so numeric-looking tokens and paths are not reinterpreted.
    fn load_with(path: Option<&str>, env: Environment) -> Result<Self, PipelineError> {
        let file = path.unwrap_or(DEFAULT_CONFIG_FILE);
        let settings = Config::builder()
            .add_source(Config::try_from(&PipelineConfig::default())?)
            .add_source(File::with_name(file).required(path.is_some()))
            .add_source(env)
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Check grid and validation settings before touching any file
    pub fn validate(&self) -> Result<(), PipelineError> {
        TimelineGrid::check_granularity(self.timeline.granularity_secs)?;
        self.validation.check()?;
        Ok(())
    }
}
