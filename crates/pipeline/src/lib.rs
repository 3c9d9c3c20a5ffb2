//! Sensor Data Pipeline
//!
//! Batch runner for daily temperature/humidity CSV files: discovers sensor
//! files, normalizes them onto the timeline grid, gap-fills, aggregates to
//! minutes and hours, and computes statistics.

mod discovery;
mod error;
mod ingest;
mod logging;
mod output;
mod settings;

pub use discovery::{discover, sensor_id_from_stem, LineSource, SensorSource};
pub use error::PipelineError;
pub use ingest::{scan_lines, Ingested, Ingestor, SensorFailure};
pub use logging::init_logging;
pub use output::{
    write_outputs, ANOMALIES_FILE, HOUR_FILE, MINUTE_FILE, NORMALIZED_FILE, STATISTICS_FILE,
    SUMMARY_FILE,
};
pub use settings::{
    AggregationConfig, LoggingConfig, PipelineConfig, TimelineConfig, DEFAULT_CONFIG_FILE,
    ENV_PREFIX,
};

use analytics::{aggregate_to, Resolution, StatisticsReport};
use data_validator::{AnomalyKind, AnomalyLog, RecordNormalizer, ScanCounters, Validator};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use timeline::{NormalizedDataset, SensorId, TimelineGrid};
use tracing::info;

/// Everything produced by one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Sensors in discovery order
    pub sensors: Vec<SensorId>,
    /// Dense dataset at the configured granularity
    pub dataset: NormalizedDataset,
    /// Chronologically sorted anomalies
    pub anomalies: AnomalyLog,
    /// `HH:MM` buckets, when enabled
    pub minute: Option<NormalizedDataset>,
    /// `HH` buckets aggregated from the minute dataset, when enabled
    pub hour: Option<NormalizedDataset>,
    pub statistics: StatisticsReport,
    /// Line outcomes per sensor
    pub counters: BTreeMap<SensorId, ScanCounters>,
    /// Sensors whose input could not be read
    pub failures: Vec<SensorFailure>,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary<'a> {
    pub sensor_count: usize,
    pub anomaly_counts: BTreeMap<AnomalyKind, usize>,
    pub lines: &'a BTreeMap<SensorId, ScanCounters>,
    pub failures: &'a [SensorFailure],
}

impl RunOutcome {
    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary {
            sensor_count: self.sensors.len(),
            anomaly_counts: self.anomalies.counts_by_kind(),
            lines: &self.counters,
            failures: &self.failures,
        }
    }
}

/// Run the core pipeline over already discovered sources
pub fn process(
    config: &PipelineConfig,
    sources: &[SensorSource],
) -> Result<RunOutcome, PipelineError> {
    config.validate()?;
    let grid = TimelineGrid::generate(config.timeline.granularity_secs)?;
    let validator = Validator::new(config.validation.clone())?;
    let normalizer = RecordNormalizer::new(&grid, &validator);

    let sensors: Vec<SensorId> = sources.iter().map(|s| s.sensor.clone()).collect();
    let mut ingestor = Ingestor::new(&normalizer, &sensors);
    for source in sources {
        info!("Processing {} ({})", source.sensor, source.path.display());
        ingestor.ingest_source(source);
    }
    let Ingested {
        dataset,
        anomalies,
        counters,
        failures,
    } = ingestor.finish();

    let (minute, hour) = if config.aggregation.minute || config.aggregation.hour {
        let minute = aggregate_to(&dataset, Resolution::Minute)?;
        let hour = if config.aggregation.hour {
            Some(aggregate_to(&minute, Resolution::Hour)?)
        } else {
            None
        };
        (config.aggregation.minute.then_some(minute), hour)
    } else {
        (None, None)
    };

    let statistics = analytics::compute(&dataset, &sensors)?;

    Ok(RunOutcome {
        sensors,
        dataset,
        anomalies,
        minute,
        hour,
        statistics,
        counters,
        failures,
    })
}

/// Discover inputs, process them, and write the outputs
pub fn run(config: &PipelineConfig) -> Result<(RunOutcome, Vec<PathBuf>), PipelineError> {
    config.validate()?;
    let sources = discover(&config.input_dir, &config.file_suffix, &config.file_extension)?;
    let outcome = process(config, &sources)?;

    for (kind, count) in outcome.anomalies.counts_by_kind() {
        info!("{:<22} {}", kind.label(), count);
    }
    info!(
        "Run complete: {} sensors, {} anomalies, {} failed",
        outcome.sensors.len(),
        outcome.anomalies.len(),
        outcome.failures.len()
    );

    let written = write_outputs(&config.output_dir, &outcome)?;
    Ok((outcome, written))
}
