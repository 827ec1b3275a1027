use std::env;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::error::Result;

/// Install stdout and file logging for the embedding host.
///
/// `TRACING_LEVEL` overrides `config.log_level`, `LOG_FILE_PATH` overrides the log file
/// (relative paths resolve under `config.data_dir`). Keep the guard alive to flush the file.
/// A host that already installed a subscriber keeps it; the guard is still returned.
pub fn init_logger(config: &AppConfig) -> Result<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| config.log_level.clone());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| config.log_file.clone());
    let log_target = Path::new(&config.data_dir).join(log_file_path);
    let log_dir = log_target.parent().unwrap_or_else(|| Path::new("."));
    let log_name = log_target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media-sweep.log".to_string());
    fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_name)
        .build(log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .try_init();

    match installed {
        Ok(()) => info!("Logging at '{}' to stdout and {}", filter, log_target.display()),
        Err(e) => warn!("Subscriber already installed, keeping it: {}", e),
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            log_file: "logs/test.log".to_string(),
            ..AppConfig::with_data_dir(dir.path())
        };

        let _first = init_logger(&config).unwrap();
        let _second = init_logger(&config).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
