//! Configuration and log paths
//!
//! Everything lives under:
//! - Unix/macOS: `$XDG_CONFIG_HOME/vastrow/` or `~/.config/vastrow/`
//! - Windows: `%APPDATA%\vastrow\`

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::{Result, VastrowError};

const APP_DIR: &str = "vastrow";

/// Base name of the daily-rotated log file
pub const LOG_FILE_NAME: &str = "vastrow.log";

/// Base config directory
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/vastrow/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/vastrow/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

/// Newest rotated log file (`vastrow.log.YYYY-MM-DD`), falling back to the
/// unrotated name when none exist yet
pub fn log_file() -> Option<PathBuf> {
    let logs_dir = logs_dir()?;
    newest_log_in(&logs_dir).or_else(|| Some(logs_dir.join(LOG_FILE_NAME)))
}

fn newest_log_in(dir: &Path) -> Option<PathBuf> {
    // YYYY-MM-DD suffixes sort naturally
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE_NAME))
        })
        .max()
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        VastrowError::Config(format!(
            "Failed to create directory {}: {}",
            path.display(),
            e
        ))
    })
}

/// Ensure the base config dir exists, returning it
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir =
        config_dir().ok_or_else(|| VastrowError::Config("No config directory available".into()))?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensure the logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = ensure_config_dir()?.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}
