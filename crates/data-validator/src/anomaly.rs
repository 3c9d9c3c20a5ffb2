//! Anomaly Ledger

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use timeline::SensorId;

/// Time recorded for lines whose time token could not be extracted
///
/// Sorts after every real slot.
pub const OUT_OF_GRID_TIME: &str = "99:99";

/// Classification of a data problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Wrong number of fields on a line
    StructureMismatch,
    /// Time token absent from the grid
    TimelineOutOfRange,
    /// Empty field
    MissingData,
    /// Non-numeric field or recognized invalid token
    InvalidData,
    /// Numeric field outside its physical range
    SensorFault,
    /// No line at all for a slot
    Gap,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 6] = [
        AnomalyKind::StructureMismatch,
        AnomalyKind::TimelineOutOfRange,
        AnomalyKind::MissingData,
        AnomalyKind::InvalidData,
        AnomalyKind::SensorFault,
        AnomalyKind::Gap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::StructureMismatch => "Structure Mismatch",
            AnomalyKind::TimelineOutOfRange => "Timeline Out Of Range",
            AnomalyKind::MissingData => "Missing Data",
            AnomalyKind::InvalidData => "Invalid Data",
            AnomalyKind::SensorFault => "Sensor Fault",
            AnomalyKind::Gap => "Gap",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded data problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Grid key, raw time token, or [`OUT_OF_GRID_TIME`]
    pub time: String,
    pub sensor: SensorId,
    pub kind: AnomalyKind,
    pub message: String,
    /// Offending line with separators stripped; `None` for gaps
    pub raw_line: Option<String>,
    /// Physical line number in the source file (header is line 1)
    pub line: Option<usize>,
    /// Source file name for line anomalies
    pub file: Option<String>,
}

impl Anomaly {
    /// Anomaly raised while reading a specific line
    pub fn at_line(
        time: impl Into<String>,
        sensor: &SensorId,
        kind: AnomalyKind,
        message: impl Into<String>,
        raw_line: &str,
        line: Option<usize>,
    ) -> Self {
        Self {
            time: time.into(),
            sensor: sensor.clone(),
            kind,
            message: message.into(),
            raw_line: Some(raw_line.to_string()),
            line,
            file: None,
        }
    }

    /// Slot for which the sensor produced no line
    pub fn gap(time: impl Into<String>, sensor: &SensorId) -> Self {
        Self {
            time: time.into(),
            sensor: sensor.clone(),
            kind: AnomalyKind::Gap,
            message: "Missing data entry".to_string(),
            raw_line: None,
            line: None,
            file: None,
        }
    }
}

/// Append-only collection of anomalies for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnomalyLog {
    entries: Vec<Anomaly>,
}

impl AnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, anomaly: Anomaly) {
        self.entries.push(anomaly);
    }

    pub fn extend(&mut self, anomalies: impl IntoIterator<Item = Anomaly>) {
        self.entries.extend(anomalies);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Anomaly] {
        &self.entries
    }

    /// Sort by time token; equal times keep discovery order
    pub fn sort_chronologically(&mut self) {
        self.entries.sort_by(|a, b| a.time.cmp(&b.time));
    }

    /// Number of anomalies per kind, every kind present
    pub fn counts_by_kind(&self) -> BTreeMap<AnomalyKind, usize> {
        let mut counts: BTreeMap<AnomalyKind, usize> =
            AnomalyKind::ALL.iter().map(|k| (*k, 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }
}
