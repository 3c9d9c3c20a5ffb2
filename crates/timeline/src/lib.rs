//! Timeline Grid and Normalized Dataset
//!
//! Provides the canonical set of time slots for one day and the dense
//! `(TimeKey, SensorId) -> Observation` store built on top of it.

mod dataset;
mod grid;

pub use dataset::{FieldValue, NormalizedDataset, Observation, SensorId};
pub use grid::{GridError, TimeKey, TimelineGrid, SECONDS_PER_DAY};
