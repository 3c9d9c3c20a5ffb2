//! Per-sensor ingestion into the shared dataset

use crate::discovery::{LineSource, SensorSource};
use data_validator::{
    detect_gaps, AnomalyLog, RecordNormalizer, ScanCounters, ScanOutput, SensorScan,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::PathBuf;
use timeline::{NormalizedDataset, SensorId};
use tracing::{debug, warn};

/// Input that could not be read; the sensor contributes only gaps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorFailure {
    pub sensor: SensorId,
    pub path: PathBuf,
    pub error: String,
}

/// Scan a sequence of numbered lines for one sensor
///
/// Stops at the first read error; nothing scanned so far is returned in that case.
pub fn scan_lines<I>(
    normalizer: &RecordNormalizer<'_>,
    sensor: &SensorId,
    lines: I,
) -> io::Result<ScanOutput>
where
    I: IntoIterator<Item = io::Result<(usize, String)>>,
{
    let mut scan = SensorScan::new(normalizer, sensor.clone());
    for line in lines {
        let (line_no, text) = line?;
        scan.push_line(&text, Some(line_no));
    }
    Ok(scan.finish())
}

/// Owns the dataset and anomaly ledger while sensors are ingested one at a time
pub struct Ingestor<'a> {
    normalizer: &'a RecordNormalizer<'a>,
    dataset: NormalizedDataset,
    anomalies: AnomalyLog,
    counters: BTreeMap<SensorId, ScanCounters>,
    failures: Vec<SensorFailure>,
}

/// Frozen result of ingesting every sensor
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub dataset: NormalizedDataset,
    /// Sorted chronologically
    pub anomalies: AnomalyLog,
    pub counters: BTreeMap<SensorId, ScanCounters>,
    pub failures: Vec<SensorFailure>,
}

impl<'a> Ingestor<'a> {
    pub fn new(normalizer: &'a RecordNormalizer<'a>, sensors: &[SensorId]) -> Self {
        Self {
            normalizer,
            dataset: NormalizedDataset::over_grid(normalizer.grid(), sensors.iter().cloned()),
            anomalies: AnomalyLog::new(),
            counters: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Apply a completed scan; observations overwrite in file order
    pub fn commit(&mut self, output: ScanOutput) {
        let sensor = output.sensor.as_str();
        for (key, observation) in &output.observations {
            if !self.dataset.set(key.as_str(), sensor, *observation) {
                debug!("Dropping observation for unknown sensor {}", sensor);
            }
        }
        self.anomalies.extend(output.anomalies);
        self.counters.insert(output.sensor, output.counters);
    }

    /// Record a sensor whose input could not be read
    pub fn fail(&mut self, source: &SensorSource, error: &io::Error) {
        warn!(
            "Failed to read {} for sensor {}: {}",
            source.path.display(),
            source.sensor,
            error
        );
        self.dataset.reset_sensor(source.sensor.as_str());
        self.anomalies
            .extend(detect_gaps(self.normalizer.grid(), &HashSet::new(), &source.sensor));
        self.counters.insert(source.sensor.clone(), ScanCounters::default());
        self.failures.push(SensorFailure {
            sensor: source.sensor.clone(),
            path: source.path.clone(),
            error: error.to_string(),
        });
    }

    /// Read and commit one sensor file; I/O problems only affect this sensor
    pub fn ingest_source(&mut self, source: &SensorSource) {
        let scanned = LineSource::open(&source.path)
            .and_then(|lines| scan_lines(self.normalizer, &source.sensor, lines));
        match scanned {
            Ok(mut output) => {
                if let Some(name) = source.path.file_name() {
                    output.attribute_to(&name.to_string_lossy());
                }
                self.commit(output)
            }
            Err(e) => self.fail(source, &e),
        }
    }

    pub fn finish(mut self) -> Ingested {
        self.anomalies.sort_chronologically();
        Ingested {
            dataset: self.dataset,
            anomalies: self.anomalies,
            counters: self.counters,
            failures: self.failures,
        }
    }
}
