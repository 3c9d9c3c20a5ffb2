//! Data Validation and Normalization
//!
//! Classifies raw temperature/humidity fields, normalizes delimited lines onto
//! the timeline grid, and records every anomaly found along the way.

mod anomaly;
mod error;
mod gaps;
mod normalizer;
mod scan;
mod validator;

pub use anomaly::{Anomaly, AnomalyKind, AnomalyLog, OUT_OF_GRID_TIME};
pub use error::{FieldFault, ValidationError};
pub use gaps::detect_gaps;
pub use normalizer::{NormalizeResult, RecordNormalizer, EXPECTED_FIELDS};
pub use scan::{ScanCounters, ScanOutput, SensorScan};
pub use validator::{validate, Field, InvalidTokens, ValidationConfig, Validator, ValueRange};
