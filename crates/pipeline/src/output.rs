//! JSON output writers

use crate::error::PipelineError;
use crate::RunOutcome;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ANOMALIES_FILE: &str = "anomalies.json";
pub const NORMALIZED_FILE: &str = "normalized.json";
pub const MINUTE_FILE: &str = "aggregated_minute.json";
pub const HOUR_FILE: &str = "aggregated_hour.json";
pub const STATISTICS_FILE: &str = "statistics.json";
pub const SUMMARY_FILE: &str = "run_summary.json";

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| PipelineError::io(path, e))
}

/// Write every result of a run into `dir`, returning the files written
pub fn write_outputs(dir: &Path, outcome: &RunOutcome) -> Result<Vec<PathBuf>, PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut written = vec![dir.join(ANOMALIES_FILE), dir.join(NORMALIZED_FILE)];
    write_json(&written[0], &outcome.anomalies)?;
    write_json(&written[1], &outcome.dataset)?;

    if let Some(minute) = &outcome.minute {
        let path = dir.join(MINUTE_FILE);
        write_json(&path, minute)?;
        written.push(path);
    }
    if let Some(hour) = &outcome.hour {
        let path = dir.join(HOUR_FILE);
        write_json(&path, hour)?;
        written.push(path);
    }

    let path = dir.join(STATISTICS_FILE);
    write_json(&path, &outcome.statistics)?;
    written.push(path);

    let path = dir.join(SUMMARY_FILE);
    write_json(&path, &outcome.summary())?;
    written.push(path);

    info!("Wrote {} output files to {}", written.len(), dir.display());
    Ok(written)
}
