//! Per-Sensor Line Scan

use crate::anomaly::Anomaly;
use crate::gaps::detect_gaps;
use crate::normalizer::{NormalizeResult, RecordNormalizer};
use serde::Serialize;
use std::collections::HashSet;
use timeline::{Observation, SensorId, TimeKey};
use tracing::debug;

/// Line outcome counters for one sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounters {
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
}

/// Buffered result of scanning one sensor's lines, not yet applied to a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutput {
    pub sensor: SensorId,
    /// Observations in file order; later entries for a key overwrite earlier ones
    pub observations: Vec<(TimeKey, Observation)>,
    /// Line anomalies in file order, followed by gaps
    pub anomalies: Vec<Anomaly>,
    pub counters: ScanCounters,
}

impl ScanOutput {
    /// Record the source file on every anomaly raised by a line
    pub fn attribute_to(&mut self, file: &str) {
        for anomaly in self.anomalies.iter_mut().filter(|a| a.line.is_some()) {
            anomaly.file = Some(file.to_string());
        }
    }
}

/// Accumulates one sensor's lines in file order
pub struct SensorScan<'a> {
    normalizer: &'a RecordNormalizer<'a>,
    sensor: SensorId,
    seen: HashSet<TimeKey>,
    observations: Vec<(TimeKey, Observation)>,
    anomalies: Vec<Anomaly>,
    counters: ScanCounters,
}

impl<'a> SensorScan<'a> {
    pub fn new(normalizer: &'a RecordNormalizer<'a>, sensor: SensorId) -> Self {
        Self {
            normalizer,
            sensor,
            seen: HashSet::new(),
            observations: Vec::new(),
            anomalies: Vec::new(),
            counters: ScanCounters::default(),
        }
    }

    /// Normalize and record one raw line
    pub fn push_line(&mut self, raw_line: &str, line_no: Option<usize>) {
        match self.normalizer.normalize(raw_line, line_no, &self.sensor) {
            NormalizeResult::Skipped => self.counters.skipped += 1,
            NormalizeResult::Rejected(anomaly) => {
                self.counters.rejected += 1;
                self.anomalies.push(anomaly);
            }
            NormalizeResult::Accepted {
                key,
                observation,
                anomalies,
            } => {
                self.counters.accepted += 1;
                self.seen.insert(key.clone());
                self.observations.push((key, observation));
                self.anomalies.extend(anomalies);
            }
        }
    }

    /// Slots that received at least one accepted line
    pub fn seen(&self) -> &HashSet<TimeKey> {
        &self.seen
    }

    /// Close the scan, appending a gap for every slot never seen
    pub fn finish(mut self) -> ScanOutput {
        let gaps = detect_gaps(self.normalizer.grid(), &self.seen, &self.sensor);
        debug!(
            "{}: {} accepted, {} rejected, {} skipped, {} gaps",
            self.sensor,
            self.counters.accepted,
            self.counters.rejected,
            self.counters.skipped,
            gaps.len()
        );
        self.anomalies.extend(gaps);
        ScanOutput {
            sensor: self.sensor,
            observations: self.observations,
            anomalies: self.anomalies,
            counters: self.counters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyKind;
    use crate::validator::{ValidationConfig, Validator};
    use timeline::{FieldValue, TimelineGrid};

    #[test]
    fn test_scan_counts_and_gaps() {
        let grid = TimelineGrid::generate(3600).unwrap();
        let validator = Validator::new(ValidationConfig::default()).unwrap();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        let mut scan = SensorScan::new(&normalizer, SensorId::from("SENSOR01"));

        scan.push_line("02.09.2024;00:00;20;50", Some(2));
        scan.push_line("", Some(3));
        scan.push_line("02.09.2024;01:00;abc;50", Some(4));
        scan.push_line("02.09.2024;25:00;20;50", Some(5));
        scan.push_line("02.09.2024;02:00", Some(6));
        scan.push_line("02.09.2024;00:00;21;51", Some(7));
        assert_eq!(scan.seen().len(), 2);

        let out = scan.finish();
        assert_eq!(
            out.counters,
            ScanCounters {
                accepted: 3,
                rejected: 2,
                skipped: 1
            }
        );
        assert_eq!(out.observations.len(), 3);
        assert_eq!(out.observations[2].1.temp, FieldValue::Value(21.0));

        let gaps = out.anomalies.iter().filter(|a| a.kind == AnomalyKind::Gap).count();
        assert_eq!(gaps, 22);
        // out-of-range time does not count as seen
        assert!(out
            .anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::Gap && a.time == "02:00"));
        assert_eq!(out.anomalies.len(), 3 + 22);

        let mut out = out;
        out.attribute_to("SENSOR01_DIRTY.csv");
        for anomaly in &out.anomalies {
            match anomaly.kind {
                AnomalyKind::Gap => assert_eq!(anomaly.file, None),
                _ => assert_eq!(anomaly.file.as_deref(), Some("SENSOR01_DIRTY.csv")),
            }
        }
    }
}
