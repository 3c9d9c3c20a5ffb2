//! Sensor file discovery and line reading

use crate::error::PipelineError;
use glob::MatchOptions;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use timeline::SensorId;
use tracing::{info, warn};

/// One input file and the sensor it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSource {
    pub path: PathBuf,
    pub sensor: SensorId,
}

/// Strip `suffix` (case-insensitive) from the end of a file stem
pub fn sensor_id_from_stem(stem: &str, suffix: &str) -> SensorId {
    let cut = stem.len().saturating_sub(suffix.len());
    match (stem.get(..cut), stem.get(cut..)) {
        (Some(head), Some(tail)) if !head.is_empty() && tail.eq_ignore_ascii_case(suffix) => {
            SensorId::from(head)
        }
        _ => SensorId::from(stem),
    }
}

/// Find `<dir>/*<suffix>.<extension>` files, sorted by path
///
/// A missing directory yields no sources. Two files resolving to the same
/// sensor keep only the first.
pub fn discover(
    dir: &Path,
    suffix: &str,
    extension: &str,
) -> Result<Vec<SensorSource>, PipelineError> {
    if !dir.is_dir() {
        warn!("Input directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/*{}.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(suffix),
        glob::Pattern::escape(extension)
    );
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut paths = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    paths.sort();

    let mut sources: Vec<SensorSource> = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => continue,
        };
        let sensor = sensor_id_from_stem(&stem, suffix);
        if sources.iter().any(|s| s.sensor == sensor) {
            warn!("Duplicate file for sensor {}: {}", sensor, path.display());
            continue;
        }
        sources.push(SensorSource { path, sensor });
    }

    info!("Discovered {} sensor files in {}", sources.len(), dir.display());
    Ok(sources)
}

/// Data lines of a file with their physical line numbers
///
/// The header (line 1) is skipped, line separators are stripped, and invalid
/// UTF-8 is replaced rather than failing the file.
pub struct LineSource<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl LineSource<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    if self.line_no == 1 {
                        continue;
                    }
                    let text = String::from_utf8_lossy(&self.buf);
                    let line = text.trim_end_matches(&['\n', '\r'][..]).to_string();
                    return Some(Ok((self.line_no, line)));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
