//! Validation Error Types

use crate::anomaly::AnomalyKind;
use thiserror::Error;

/// Errors in validation configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Range whose lower bound exceeds its upper bound
    #[error("{field} range [{min}, {max}] is inverted")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    /// Range with a NaN or infinite bound
    #[error("{field} range bound is not finite")]
    NonFiniteBound { field: &'static str },

    /// Line delimiter that would never split a record
    #[error("Invalid delimiter: {0:?}")]
    InvalidDelimiter(char),
}

/// Reason a single raw field could not be accepted as a reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldFault {
    /// Empty or blank field
    #[error("missing value")]
    Missing,

    /// Field matched a configured invalid token
    #[error("invalid token {0:?}")]
    InvalidToken(String),

    /// Field is not a finite number
    #[error("non-numeric value {0:?}")]
    NotNumeric(String),

    /// Numeric value outside the physical range
    #[error("value {value} is out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

impl FieldFault {
    /// Anomaly classification for this fault
    pub fn kind(&self) -> AnomalyKind {
        match self {
            FieldFault::Missing => AnomalyKind::MissingData,
            FieldFault::InvalidToken(_) | FieldFault::NotNumeric(_) => AnomalyKind::InvalidData,
            FieldFault::OutOfRange { .. } => AnomalyKind::SensorFault,
        }
    }
}
