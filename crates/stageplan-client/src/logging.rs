use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{Result, StageplanError};

const LOG_ENV: &str = "STAGEPLAN_LOG";

/// Path of the log file inside the data directory
pub fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join("logs").join("stageplan.log")
}

/// Send `tracing` output to `<data dir>/logs/stageplan.log`.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or
/// stderr. `STAGEPLAN_LOG` overrides `level` with a full filter directive.
pub fn init(data_dir: &Path, level: &str) -> Result<PathBuf> {
    let path = log_file_path(data_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| StageplanError::General(format!("failed to initialize logging: {e}")))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "stageplan starting");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_lives_under_data_dir() {
        let path = log_file_path(Path::new("/home/crew/.stageplan"));
        assert_eq!(path, PathBuf::from("/home/crew/.stageplan/logs/stageplan.log"));
    }
}
