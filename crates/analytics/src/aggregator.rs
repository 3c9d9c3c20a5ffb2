//! Bucket Aggregation

use crate::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use timeline::{FieldValue, NormalizedDataset, Observation, SensorId, TimeKey};
use tracing::debug;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the readings among `values`, rounded to two decimals
///
/// `NotAvailable` entries are ignored; no readings at all gives `NotAvailable`.
pub fn mean_of(values: impl IntoIterator<Item = FieldValue>) -> FieldValue {
    let (sum, count) = values
        .into_iter()
        .filter_map(|v| v.as_f64())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        FieldValue::NotAvailable
    } else {
        FieldValue::Value(round2(sum / count as f64))
    }
}

/// Coarse bucket -> fine keys it covers, in bucket order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketMap {
    buckets: Vec<(TimeKey, Vec<TimeKey>)>,
}

impl BucketMap {
    pub fn new(buckets: Vec<(TimeKey, Vec<TimeKey>)>) -> Self {
        Self { buckets }
    }

    /// Group keys by their leading `len` characters, buckets in first-seen order
    ///
    /// `"13:05:40"` with 5 lands in `"13:05"`; `"13:05"` with 2 lands in `"13"`.
    pub fn by_prefix<'a>(keys: impl IntoIterator<Item = &'a TimeKey>, len: usize) -> Self {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<(TimeKey, Vec<TimeKey>)> = Vec::new();
        for key in keys {
            let prefix = key.as_str().get(..len).unwrap_or(key.as_str());
            let pos = match positions.get(prefix) {
                Some(&pos) => pos,
                None => {
                    positions.insert(prefix.to_string(), buckets.len());
                    buckets.push((TimeKey::from(prefix), Vec::new()));
                    buckets.len() - 1
                }
            };
            buckets[pos].1.push(key.clone());
        }
        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn coarse_keys(&self) -> impl Iterator<Item = &TimeKey> {
        self.buckets.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeKey, &[TimeKey])> {
        self.buckets.iter().map(|(k, fine)| (k, fine.as_slice()))
    }
}

/// Target bucket size for re-aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// `HH:MM`
    Minute,
    /// `HH`
    Hour,
}

impl Resolution {
    pub fn prefix_len(&self) -> usize {
        match self {
            Resolution::Minute => 5,
            Resolution::Hour => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
        }
    }
}

/// Average every sensor's readings within each coarse bucket
///
/// Temperature and humidity are averaged independently; anomalies are not re-derived.
pub fn aggregate(
    fine: &NormalizedDataset,
    sensors: &[SensorId],
    buckets: &BucketMap,
) -> Result<NormalizedDataset, AnalyticsError> {
    for sensor in sensors {
        if fine.sensor_position(sensor.as_str()).is_none() {
            return Err(AnalyticsError::UnknownSensor(sensor.to_string()));
        }
    }

    let mut coarse =
        NormalizedDataset::new(buckets.coarse_keys().cloned(), sensors.iter().cloned());

    for (bucket, fine_keys) in buckets.iter() {
        let mut samples = Vec::with_capacity(fine_keys.len());
        for key in fine_keys {
            if fine.key_position(key.as_str()).is_none() {
                return Err(AnalyticsError::UnknownKey(key.to_string()));
            }
        }

        for sensor in sensors {
            samples.clear();
            samples.extend(
                fine_keys
                    .iter()
                    .filter_map(|k| fine.get(k.as_str(), sensor.as_str()).copied()),
            );
            let observation = Observation::new(
                mean_of(samples.iter().map(|o| o.temp)),
                mean_of(samples.iter().map(|o| o.hum)),
            );
            coarse.set(bucket.as_str(), sensor.as_str(), observation);
        }
    }

    debug!(
        "Aggregated {} keys into {} buckets for {} sensors",
        fine.keys().len(),
        buckets.len(),
        sensors.len()
    );
    Ok(coarse)
}

/// Aggregate all sensors of a dataset to the given resolution
pub fn aggregate_to(
    fine: &NormalizedDataset,
    resolution: Resolution,
) -> Result<NormalizedDataset, AnalyticsError> {
    let buckets = BucketMap::by_prefix(fine.keys(), resolution.prefix_len());
    debug!("Aggregating to {} resolution", resolution.name());
    aggregate(fine, fine.sensors(), &buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline::TimelineGrid;

    fn sensor() -> SensorId {
        SensorId::from("SENSOR01")
    }

    #[test]
    fn test_mean_ignores_not_available() {
        let values = [FieldValue::Value(10.0), FieldValue::Value(20.0), FieldValue::NotAvailable];
        assert_eq!(mean_of(values), FieldValue::Value(15.0));
        assert_eq!(mean_of([FieldValue::NotAvailable; 3]), FieldValue::NotAvailable);
        assert_eq!(mean_of(Vec::new()), FieldValue::NotAvailable);
    }

    #[test]
    fn test_mean_rounds_to_two_decimals() {
        let values = [FieldValue::Value(1.0), FieldValue::Value(1.0), FieldValue::Value(2.0)];
        assert_eq!(mean_of(values), FieldValue::Value(1.33));
    }

    #[test]
    fn test_bucket_map_by_prefix() {
        let grid = TimelineGrid::generate(15).unwrap();
        let minutes = BucketMap::by_prefix(grid.keys(), Resolution::Minute.prefix_len());
        assert_eq!(minutes.len(), 1440);
        let (first, fine) = minutes.iter().next().unwrap();
        assert_eq!(first.as_str(), "00:00");
        let fine: Vec<_> = fine.iter().map(TimeKey::as_str).collect();
        assert_eq!(fine, vec!["00:00:00", "00:00:15", "00:00:30", "00:00:45"]);

        let hours = BucketMap::by_prefix(minutes.coarse_keys(), Resolution::Hour.prefix_len());
        assert_eq!(hours.len(), 24);
        assert_eq!(hours.coarse_keys().last().unwrap().as_str(), "23");
    }

    #[test]
    fn test_minute_grid_to_minutes_is_identity_mapping() {
        let grid = TimelineGrid::generate(60).unwrap();
        let buckets = BucketMap::by_prefix(grid.keys(), Resolution::Minute.prefix_len());
        assert_eq!(buckets.len(), grid.len());
        assert!(buckets.iter().all(|(k, fine)| fine.len() == 1 && fine[0] == *k));
    }

    #[test]
    fn test_chained_aggregation() {
        let grid = TimelineGrid::generate(30).unwrap();
        let mut fine = NormalizedDataset::over_grid(&grid, vec![sensor()]);
        let na = FieldValue::NotAvailable;
        let reading = |t: f64, h: FieldValue| Observation::new(FieldValue::Value(t), h);
        fine.set("10:00:00", "SENSOR01", reading(10.0, FieldValue::Value(40.0)));
        fine.set("10:00:30", "SENSOR01", reading(20.0, na));
        fine.set("10:01:00", "SENSOR01", reading(30.0, na));

        let minute = aggregate_to(&fine, Resolution::Minute).unwrap();
        assert_eq!(minute.keys().len(), 1440);
        assert_eq!(
            minute.get("10:00", "SENSOR01"),
            Some(&Observation::new(FieldValue::Value(15.0), FieldValue::Value(40.0)))
        );
        assert_eq!(
            minute.get("10:01", "SENSOR01"),
            Some(&Observation::new(FieldValue::Value(30.0), FieldValue::NotAvailable))
        );
        assert_eq!(minute.get("10:02", "SENSOR01"), Some(&Observation::default()));

        let hour = aggregate_to(&minute, Resolution::Hour).unwrap();
        assert_eq!(hour.keys().len(), 24);
        assert_eq!(
            hour.get("10", "SENSOR01"),
            Some(&Observation::new(FieldValue::Value(22.5), FieldValue::Value(40.0)))
        );
        assert_eq!(hour.get("11", "SENSOR01"), Some(&Observation::default()));
    }

    #[test]
    fn test_unknown_inputs() {
        let grid = TimelineGrid::generate(3600).unwrap();
        let fine = NormalizedDataset::over_grid(&grid, vec![sensor()]);
        let bad_bucket = BucketMap::new(vec![(TimeKey::from("00"), vec![TimeKey::from("00:30")])]);
        assert_eq!(
            aggregate(&fine, &[sensor()], &bad_bucket),
            Err(AnalyticsError::UnknownKey("00:30".to_string()))
        );
        let buckets = BucketMap::by_prefix(grid.keys(), 2);
        assert_eq!(
            aggregate(&fine, &[SensorId::from("other")], &buckets),
            Err(AnalyticsError::UnknownSensor("other".to_string()))
        );
    }
}
