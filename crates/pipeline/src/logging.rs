//! Logging setup

use crate::error::PipelineError;
use crate::settings::LoggingConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<(), PipelineError> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| PipelineError::InvalidLogLevel(config.level.clone()))?;

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.map_err(|e| PipelineError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            json: false,
        };
        assert!(matches!(init_logging(&config), Err(PipelineError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_second_install_fails() {
        let config = LoggingConfig::default();
        let first = init_logging(&config);
        let second = init_logging(&config);
        // another test binary may already own the global subscriber
        assert!(first.is_err() || matches!(second, Err(PipelineError::Logging(_))));
    }
}
