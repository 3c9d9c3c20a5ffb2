//! Record Normalization onto the Timeline Grid

use crate::anomaly::{Anomaly, AnomalyKind, OUT_OF_GRID_TIME};
use crate::validator::{Field, Validator};
use timeline::{FieldValue, Observation, SensorId, TimeKey, TimelineGrid};
use tracing::debug;

/// Date, time, temperature, humidity
pub const EXPECTED_FIELDS: usize = 4;

/// Outcome of normalizing one raw line
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeResult {
    /// Blank line, ignored
    Skipped,
    /// Line could not be placed on the grid; nothing is written
    Rejected(Anomaly),
    /// Line placed on the grid, possibly with field-level anomalies
    Accepted {
        key: TimeKey,
        observation: Observation,
        anomalies: Vec<Anomaly>,
    },
}

/// Turns raw delimited lines into grid-aligned observations
pub struct RecordNormalizer<'a> {
    grid: &'a TimelineGrid,
    validator: &'a Validator,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(grid: &'a TimelineGrid, validator: &'a Validator) -> Self {
        Self { grid, validator }
    }

    pub fn grid(&self) -> &TimelineGrid {
        self.grid
    }

    /// Normalize one line for a sensor
    ///
    /// `line_no` is the physical line number used in anomaly records.
    pub fn normalize(
        &self,
        raw_line: &str,
        line_no: Option<usize>,
        sensor: &SensorId,
    ) -> NormalizeResult {
        let line = raw_line.trim();
        if line.is_empty() {
            return NormalizeResult::Skipped;
        }

        let parts: Vec<&str> = line.split(self.validator.delimiter()).map(str::trim).collect();
        if parts.len() != EXPECTED_FIELDS {
            debug!("{} line {:?}: {} fields", sensor, line_no, parts.len());
            return NormalizeResult::Rejected(Anomaly::at_line(
                OUT_OF_GRID_TIME,
                sensor,
                AnomalyKind::StructureMismatch,
                format!("Expected {} fields, found {}", EXPECTED_FIELDS, parts.len()),
                line,
                line_no,
            ));
        }

        let time_token = parts[1];
        let key = match self.grid.resolve(time_token) {
            Some(key) => key.clone(),
            None => {
                debug!("{} line {:?}: time {:?} not on grid", sensor, line_no, time_token);
                return NormalizeResult::Rejected(Anomaly::at_line(
                    time_token,
                    sensor,
                    AnomalyKind::TimelineOutOfRange,
                    format!("Time {:?} is not on the timeline", time_token),
                    line,
                    line_no,
                ));
            }
        };

        let mut anomalies = Vec::new();
        let mut field_value = |field: Field, raw: &str| -> FieldValue {
            match self.validator.validate_field(field, raw) {
                Ok(v) => FieldValue::Value(v),
                Err(fault) => {
                    anomalies.push(Anomaly::at_line(
                        key.as_str(),
                        sensor,
                        fault.kind(),
                        format!("{}: {}", field, fault),
                        line,
                        line_no,
                    ));
                    FieldValue::NotAvailable
                }
            }
        };

        let temp = field_value(Field::Temperature, parts[2]);
        let hum = field_value(Field::Humidity, parts[3]);

        NormalizeResult::Accepted {
            key,
            observation: Observation::new(temp, hum),
            anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationConfig;

    fn setup() -> (TimelineGrid, Validator, SensorId) {
        (
            TimelineGrid::generate(60).unwrap(),
            Validator::new(ValidationConfig::default()).unwrap(),
            SensorId::from("SENSOR01"),
        )
    }

    #[test]
    fn test_valid_line() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        let result = normalizer.normalize("02.09.2024;08:15;21.4;55.0\n", Some(2), &sensor);
        assert_eq!(
            result,
            NormalizeResult::Accepted {
                key: TimeKey::from("08:15"),
                observation: Observation::new(FieldValue::Value(21.4), FieldValue::Value(55.0)),
                anomalies: vec![],
            }
        );
    }

    #[test]
    fn test_whitespace_around_fields() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        match normalizer.normalize(" 02.09.2024 ;  08:15 ; 21.4 ;55.0  ", None, &sensor) {
            NormalizeResult::Accepted { key, anomalies, .. } => {
                assert_eq!(key.as_str(), "08:15");
                assert!(anomalies.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_blank_line_skipped() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        assert_eq!(normalizer.normalize("   \r\n", Some(7), &sensor), NormalizeResult::Skipped);
    }

    #[test]
    fn test_three_fields_structure_mismatch() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        match normalizer.normalize("02.09.2024;08:15;21.4", Some(5), &sensor) {
            NormalizeResult::Rejected(a) => {
                assert_eq!(a.kind, AnomalyKind::StructureMismatch);
                assert_eq!(a.time, OUT_OF_GRID_TIME);
                assert_eq!(a.line, Some(5));
                assert_eq!(a.raw_line.as_deref(), Some("02.09.2024;08:15;21.4"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_time_out_of_range_keeps_raw_token() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        match normalizer.normalize("02.09.2024;25:70;21.4;55", Some(9), &sensor) {
            NormalizeResult::Rejected(a) => {
                assert_eq!(a.kind, AnomalyKind::TimelineOutOfRange);
                assert_eq!(a.time, "25:70");
            }
            other => panic!("unexpected {:?}", other),
        }
        // seconds are not part of a minute grid
        assert!(matches!(
            normalizer.normalize("02.09.2024;08:15:00;21.4;55", None, &sensor),
            NormalizeResult::Rejected(_)
        ));
    }

    #[test]
    fn test_both_fields_fail_independently() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        match normalizer.normalize("02.09.2024;23:59;;NaN", Some(3), &sensor) {
            NormalizeResult::Accepted {
                key,
                observation,
                anomalies,
            } => {
                assert_eq!(key.as_str(), "23:59");
                assert_eq!(observation, Observation::default());
                let kinds: Vec<_> = anomalies.iter().map(|a| a.kind).collect();
                assert_eq!(kinds, vec![AnomalyKind::MissingData, AnomalyKind::InvalidData]);
                assert!(anomalies.iter().all(|a| a.time == "23:59"));
                assert!(anomalies[0].message.starts_with("Temperature"));
                assert!(anomalies[1].message.starts_with("Humidity"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sensor_fault_single_field() {
        let (grid, validator, sensor) = setup();
        let normalizer = RecordNormalizer::new(&grid, &validator);
        match normalizer.normalize("02.09.2024;00:00;999;40", None, &sensor) {
            NormalizeResult::Accepted {
                observation,
                anomalies,
                ..
            } => {
                assert_eq!(observation.temp, FieldValue::NotAvailable);
                assert_eq!(observation.hum, FieldValue::Value(40.0));
                assert_eq!(anomalies.len(), 1);
                assert_eq!(anomalies[0].kind, AnomalyKind::SensorFault);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_second_level_grid() {
        let grid = TimelineGrid::generate(5).unwrap();
        let validator = Validator::new(ValidationConfig::default()).unwrap();
        let sensor = SensorId::from("S");
        let normalizer = RecordNormalizer::new(&grid, &validator);
        assert!(matches!(
            normalizer.normalize("01.09.2024;12:00:05;20;50", None, &sensor),
            NormalizeResult::Accepted { .. }
        ));
        assert!(matches!(
            normalizer.normalize("01.09.2024;12:00:07;20;50", None, &sensor),
            NormalizeResult::Rejected(_)
        ));
    }
}
