use std::env;
use std::path::{Path, PathBuf};

use crate::config::{expand_home, home_dir, Config};
use crate::error::{Result, StageplanError};

const DATA_DIR_NAME: &str = ".stageplan";
const DATA_DIR_ENV: &str = "STAGEPLAN_DIR";

/// Resolve the data directory with priority:
/// 1. --data-dir CLI flag (highest)
/// 2. STAGEPLAN_DIR environment variable
/// 3. Config file dataDirectory
/// 4. Default ~/.stageplan/ (lowest)
pub fn resolve_data_directory(cli_data_dir: Option<&Path>, config: &Config) -> Result<PathBuf> {
    let env_dir = env::var(DATA_DIR_ENV).ok();
    match select_candidate(cli_data_dir, env_dir.as_deref(), config)? {
        Some(candidate) => resolve_custom_directory(&candidate),
        None => Ok(home_dir()?.join(DATA_DIR_NAME)),
    }
}

fn select_candidate(
    cli_data_dir: Option<&Path>,
    env_dir: Option<&str>,
    config: &Config,
) -> Result<Option<String>> {
    if let Some(dir) = cli_data_dir {
        let dir = dir.to_string_lossy().to_string();
        if dir.trim().is_empty() {
            return Err(StageplanError::InvalidDirectory(
                "--data-dir requires a value".to_string(),
            ));
        }
        return Ok(Some(dir));
    }

    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return Ok(Some(dir.to_string()));
    }

    // The config default is the home directory itself, meaning the standard
    // location.
    let home = home_dir()?.to_string_lossy().to_string();
    let configured = &config.data_directory;
    if configured != "~" && configured != &home {
        return Ok(Some(configured.clone()));
    }

    Ok(None)
}

/// A custom directory either names the data directory itself (ending in
/// `.stageplan`) or an existing parent to create it in.
fn resolve_custom_directory(candidate: &str) -> Result<PathBuf> {
    let expanded = expand_home(candidate)?;
    let resolved = expanded.canonicalize().unwrap_or(expanded);

    if is_data_directory_path(&resolved) {
        let parent = resolved.parent().ok_or_else(|| {
            StageplanError::InvalidDirectory(format!("{candidate}: path has no parent"))
        })?;
        assert_directory_exists(parent, candidate)?;
        return Ok(resolved);
    }

    assert_directory_exists(&resolved, candidate)?;
    Ok(resolved.join(DATA_DIR_NAME))
}

fn is_data_directory_path(path: &Path) -> bool {
    path.file_name()
        .map(|name| name == DATA_DIR_NAME)
        .unwrap_or(false)
}

fn assert_directory_exists(directory: &Path, display_path: &str) -> Result<()> {
    if directory.is_dir() {
        return Ok(());
    }
    Err(StageplanError::InvalidDirectory(display_path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flag_wins_over_env() {
        let config = Config::default();
        let selected = select_candidate(Some(Path::new("/srv/plans")), Some("/tmp/env"), &config)
            .unwrap();
        assert_eq!(selected.as_deref(), Some("/srv/plans"));
    }

    #[test]
    fn test_env_then_config() {
        let mut config = Config::default();
        config.data_directory = "/opt/config-dir".to_string();
        assert_eq!(
            select_candidate(None, Some("/tmp/env"), &config).unwrap().as_deref(),
            Some("/tmp/env")
        );
        assert_eq!(
            select_candidate(None, Some("  "), &config).unwrap().as_deref(),
            Some("/opt/config-dir")
        );
        assert_eq!(select_candidate(None, None, &Config::default()).unwrap(), None);
    }

    #[test]
    fn test_empty_flag_is_rejected() {
        let err = select_candidate(Some(Path::new("")), None, &Config::default()).unwrap_err();
        assert!(matches!(err, StageplanError::InvalidDirectory(_)));
    }

    #[test]
    fn test_parent_directory_gets_data_dir_appended() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().to_string_lossy().to_string();
        let resolved = resolve_custom_directory(&parent).unwrap();
        assert_eq!(resolved.file_name().unwrap(), DATA_DIR_NAME);

        let named = dir.path().join(DATA_DIR_NAME);
        let resolved = resolve_custom_directory(&named.to_string_lossy()).unwrap();
        assert_eq!(resolved.file_name().unwrap(), DATA_DIR_NAME);
    }

    #[test]
    fn test_missing_directory_is_invalid() {
        let err = resolve_custom_directory("/definitely/not/here").unwrap_err();
        assert!(matches!(err, StageplanError::InvalidDirectory(_)));
    }
}
