//! Dense Normalized Dataset

use crate::grid::{TimeKey, TimelineGrid};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Identifier of one data source, derived from its file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(String);

impl SensorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SensorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SensorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reading, or the marker that no usable reading exists
///
/// `NotAvailable` is distinct from zero. Serializes as a bare number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Finite, in-range reading
    Value(f64),
    /// Missing, unparseable, or out-of-range reading
    #[default]
    NotAvailable,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Value(v) => Some(*v),
            FieldValue::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FieldValue::Value(_))
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::NotAvailable, FieldValue::Value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => write!(f, "{:.2}", v),
            FieldValue::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// Temperature and humidity for one sensor at one slot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub temp: FieldValue,
    pub hum: FieldValue,
}

impl Observation {
    pub fn new(temp: FieldValue, hum: FieldValue) -> Self {
        Self { temp, hum }
    }

    /// Whether at least one field carries a reading
    pub fn is_active(&self) -> bool {
        self.temp.is_available() || self.hum.is_available()
    }
}

/// Observation for every `(TimeKey, SensorId)` pair of a grid
///
/// Storage is a row-major array indexed by `(key position, sensor position)`,
/// so every pair always has an entry, default or populated.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    keys: Vec<TimeKey>,
    key_index: HashMap<TimeKey, usize>,
    sensors: Vec<SensorId>,
    sensor_index: HashMap<SensorId, usize>,
    cells: Vec<Observation>,
}

impl NormalizedDataset {
    /// Create an all-default dataset; duplicate keys or sensors keep their first position
    pub fn new(
        keys: impl IntoIterator<Item = TimeKey>,
        sensors: impl IntoIterator<Item = SensorId>,
    ) -> Self {
        let mut key_list = Vec::new();
        let mut key_index = HashMap::new();
        for key in keys {
            if !key_index.contains_key(&key) {
                key_index.insert(key.clone(), key_list.len());
                key_list.push(key);
            }
        }

        let mut sensor_list = Vec::new();
        let mut sensor_index = HashMap::new();
        for sensor in sensors {
            if !sensor_index.contains_key(&sensor) {
                sensor_index.insert(sensor.clone(), sensor_list.len());
                sensor_list.push(sensor);
            }
        }

        let cells = vec![Observation::default(); key_list.len() * sensor_list.len()];
        Self {
            keys: key_list,
            key_index,
            sensors: sensor_list,
            sensor_index,
            cells,
        }
    }

    /// Dataset covering every slot of a grid
    pub fn over_grid(grid: &TimelineGrid, sensors: impl IntoIterator<Item = SensorId>) -> Self {
        Self::new(grid.iter().cloned(), sensors)
    }

    pub fn keys(&self) -> &[TimeKey] {
        &self.keys
    }

    pub fn sensors(&self) -> &[SensorId] {
        &self.sensors
    }

    pub fn key_position(&self, key: &str) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    pub fn sensor_position(&self, sensor: &str) -> Option<usize> {
        self.sensor_index.get(sensor).copied()
    }

    fn cell(&self, key_pos: usize, sensor_pos: usize) -> usize {
        key_pos * self.sensors.len() + sensor_pos
    }

    pub fn get(&self, key: &str, sensor: &str) -> Option<&Observation> {
        let k = self.key_position(key)?;
        let s = self.sensor_position(sensor)?;
        Some(&self.cells[self.cell(k, s)])
    }

    /// Overwrite the observation at a pair; returns false for an unknown pair
    pub fn set(&mut self, key: &str, sensor: &str, observation: Observation) -> bool {
        match (self.key_position(key), self.sensor_position(sensor)) {
            (Some(k), Some(s)) => {
                let idx = self.cell(k, s);
                self.cells[idx] = observation;
                true
            }
            _ => false,
        }
    }

    /// Restore every slot of a sensor to the default observation
    pub fn reset_sensor(&mut self, sensor: &str) {
        if let Some(s) = self.sensor_position(sensor) {
            for k in 0..self.keys.len() {
                let idx = self.cell(k, s);
                self.cells[idx] = Observation::default();
            }
        }
    }

    /// All slots of one sensor in chronological order
    pub fn column<'a>(
        &'a self,
        sensor: &str,
    ) -> impl Iterator<Item = (&'a TimeKey, &'a Observation)> + 'a {
        let pos = self.sensor_position(sensor);
        let width = self.sensors.len();
        self.keys.iter().enumerate().filter_map(move |(k, key)| {
            pos.map(|s| (key, &self.cells[k * width + s]))
        })
    }

    /// All sensors at one slot, in sensor order
    pub fn row<'a>(
        &'a self,
        key: &str,
    ) -> impl Iterator<Item = (&'a SensorId, &'a Observation)> + 'a {
        let start = self.key_position(key).map(|k| k * self.sensors.len());
        self.sensors
            .iter()
            .enumerate()
            .filter_map(move |(s, sensor)| start.map(|base| (sensor, &self.cells[base + s])))
    }
}

struct RowView<'a> {
    dataset: &'a NormalizedDataset,
    key: &'a TimeKey,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.dataset.sensors.len()))?;
        for (sensor, observation) in self.dataset.row(self.key.as_str()) {
            map.serialize_entry(sensor, observation)?;
        }
        map.end()
    }
}

/// Serializes as `{ time_key: { sensor: { temp, hum } } }` in chronological order
impl Serialize for NormalizedDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for key in &self.keys {
            map.serialize_entry(key, &RowView { dataset: self, key })?;
        }
        map.end()
    }
}
