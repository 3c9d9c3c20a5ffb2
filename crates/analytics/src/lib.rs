//! Aggregation and Statistics Engine
//!
//! Re-aggregates normalized data to coarser time buckets and computes
//! per-sensor and city-wide descriptive statistics.

mod aggregator;
mod statistics;

pub use aggregator::{aggregate, aggregate_to, mean_of, round2, BucketMap, Resolution};
pub use statistics::{
    compute, ActivitySpan, CityFieldStatistics, CityStatistics, FieldStatistics, SensorStatistics,
    StatisticsReport, Summary,
};

use thiserror::Error;

/// Errors from aggregation or statistics inputs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("bucket references time key {0:?} absent from the dataset")]
    UnknownKey(String),
    #[error("sensor {0:?} is not part of the dataset")]
    UnknownSensor(String),
}
