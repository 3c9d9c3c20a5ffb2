//! Sensor Data Pipeline - Main Entry Point

use pipeline::{init_logging, run, PipelineConfig};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1);
    let config = PipelineConfig::load(config_path.as_deref())?;
    init_logging(&config.logging)?;

    info!("=== Sensor Data Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Reading sensor files from {}", config.input_dir.display());

    let (outcome, written) = run(&config)?;
    for path in &written {
        info!("Output: {}", path.display());
    }
    if !outcome.failures.is_empty() {
        info!("{} sensor(s) could not be read", outcome.failures.len());
    }

    Ok(())
}
