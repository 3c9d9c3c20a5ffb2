//! Descriptive Statistics Computation

use crate::aggregator::round2;
use crate::AnalyticsError;
use serde::Serialize;
use std::collections::BTreeMap;
use timeline::{FieldValue, NormalizedDataset, Observation, SensorId, TimeKey};
use tracing::debug;

/// Raw moments of a set of readings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    /// Unrounded mean
    pub mean: f64,
    /// Population standard deviation, 0 below two samples
    pub std_dev: f64,
}

impl Summary {
    /// Compute summary from a slice of values; `None` when empty
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let std_dev = if values.len() < 2 {
            0.0
        } else {
            let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (m2 / n).sqrt()
        };

        Some(Self {
            count: values.len(),
            min,
            max,
            mean,
            std_dev,
        })
    }
}

/// Statistics of one field for one sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Rounded to two decimals
    pub mean: Option<f64>,
    pub std_dev: f64,
}

impl FieldStatistics {
    pub fn from_values(values: &[f64]) -> Self {
        match Summary::compute(values) {
            Some(s) => Self {
                count: s.count,
                min: Some(s.min),
                max: Some(s.max),
                mean: Some(round2(s.mean)),
                std_dev: s.std_dev,
            },
            None => Self {
                count: 0,
                min: None,
                max: None,
                mean: None,
                std_dev: 0.0,
            },
        }
    }
}

/// Slots where a sensor had at least one reading
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActivitySpan {
    Active {
        first: TimeKey,
        last: TimeKey,
        active_slots: usize,
    },
    NoActivity,
}

impl ActivitySpan {
    fn from_keys<'a>(keys: impl IntoIterator<Item = &'a TimeKey>) -> Self {
        let mut span: Option<(&TimeKey, &TimeKey, usize)> = None;
        for key in keys {
            span = Some(match span {
                None => (key, key, 1),
                Some((first, last, n)) => (first.min(key), last.max(key), n + 1),
            });
        }
        match span {
            Some((first, last, active_slots)) => ActivitySpan::Active {
                first: first.clone(),
                last: last.clone(),
                active_slots,
            },
            None => ActivitySpan::NoActivity,
        }
    }
}

/// Per-sensor statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatistics {
    pub temperature: FieldStatistics,
    pub humidity: FieldStatistics,
    pub activity: ActivitySpan,
}

/// Pooled statistics of one field across all sensors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityFieldStatistics {
    pub count: usize,
    /// Rounded to two decimals
    pub mean: FieldValue,
    pub min: FieldValue,
    pub max: FieldValue,
}

impl CityFieldStatistics {
    fn from_values(values: &[f64]) -> Self {
        match Summary::compute(values) {
            Some(s) => Self {
                count: s.count,
                mean: FieldValue::Value(round2(s.mean)),
                min: FieldValue::Value(s.min),
                max: FieldValue::Value(s.max),
            },
            None => Self {
                count: 0,
                mean: FieldValue::NotAvailable,
                min: FieldValue::NotAvailable,
                max: FieldValue::NotAvailable,
            },
        }
    }
}

/// City-wide statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStatistics {
    pub sensor_count: usize,
    pub active_sensor_count: usize,
    pub temperature: CityFieldStatistics,
    pub humidity: CityFieldStatistics,
}

/// Complete statistics of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub city: CityStatistics,
    pub sensors: BTreeMap<SensorId, SensorStatistics>,
}

fn readings<'a>(
    column: impl Iterator<Item = (&'a TimeKey, &'a Observation)>,
) -> (Vec<f64>, Vec<f64>, Vec<&'a TimeKey>) {
    let mut temps = Vec::new();
    let mut hums = Vec::new();
    let mut active = Vec::new();
    for (key, obs) in column {
        if let Some(t) = obs.temp.as_f64() {
            temps.push(t);
        }
        if let Some(h) = obs.hum.as_f64() {
            hums.push(h);
        }
        if obs.is_active() {
            active.push(key);
        }
    }
    (temps, hums, active)
}

/// Compute per-sensor and city-wide statistics over a dataset
pub fn compute(
    data: &NormalizedDataset,
    sensors: &[SensorId],
) -> Result<StatisticsReport, AnalyticsError> {
    let mut per_sensor = BTreeMap::new();
    let mut city_temps = Vec::new();
    let mut city_hums = Vec::new();

    for sensor in sensors {
        if data.sensor_position(sensor.as_str()).is_none() {
            return Err(AnalyticsError::UnknownSensor(sensor.to_string()));
        }
        let (temps, hums, active) = readings(data.column(sensor.as_str()));

        let stats = SensorStatistics {
            temperature: FieldStatistics::from_values(&temps),
            humidity: FieldStatistics::from_values(&hums),
            activity: ActivitySpan::from_keys(active),
        };
        debug!(
            "{}: {} temperature / {} humidity readings",
            sensor, stats.temperature.count, stats.humidity.count
        );

        city_temps.extend(temps);
        city_hums.extend(hums);
        per_sensor.insert(sensor.clone(), stats);
    }

    let active_sensor_count = per_sensor
        .values()
        .filter(|s| s.activity != ActivitySpan::NoActivity)
        .count();

    Ok(StatisticsReport {
        city: CityStatistics {
            sensor_count: per_sensor.len(),
            active_sensor_count,
            temperature: CityFieldStatistics::from_values(&city_temps),
            humidity: CityFieldStatistics::from_values(&city_hums),
        },
        sensors: per_sensor,
    })
}
