//! User configuration persistence
//!
//! Stores loader and geometry defaults in `~/.config/vastrow/config.yaml`.
//! Every field is optional in the file; missing ones take their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::ExecutionMode;
use crate::error::{Result, VastrowError};
use crate::scroll::{ScrollGeometry, SAFE_CONTENT_PX};
use crate::source::FileTableOptions;

/// Configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VastrowConfig {
    /// Rows per loaded window
    pub window_rows: u64,
    /// Resident window cap
    pub max_windows: usize,
    /// Cache byte budget in MiB
    pub cache_budget_mib: u64,
    /// Prefetch debounce in milliseconds
    pub debounce_ms: u64,
    /// Read size in bytes for indexing and window loads
    pub chunk_size: usize,
    /// Run file loading on a background thread
    pub worker: bool,
    pub row_height: f64,
    pub header_height: f64,
    pub footer_height: f64,
    /// Full height of the scrolling table
    pub scroller_height: f64,
    /// Extra rows materialized below the viewport
    pub overscan: u64,
    /// Cap for the scrollable content height in pixels
    pub safe_content_px: u64,
}

impl Default for VastrowConfig {
    fn default() -> Self {
        let options = FileTableOptions::default();
        let geometry = ScrollGeometry::default();
        Self {
            window_rows: options.window_rows,
            max_windows: options.max_windows,
            cache_budget_mib: options.cache_budget_bytes / (1024 * 1024),
            debounce_ms: options.prefetch_debounce.as_millis() as u64,
            chunk_size: options.chunk_size,
            worker: true,
            row_height: geometry.row_height,
            header_height: geometry.header_height,
            footer_height: geometry.footer_height,
            scroller_height: geometry.viewport_height,
            overscan: 5,
            safe_content_px: SAFE_CONTENT_PX,
        }
    }
}

impl VastrowConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse a config file, surfacing read and parse failures
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid "all defaults" config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Save config to the user config directory
    pub fn save(&self) -> Result<()> {
        let dir = crate::config_paths::ensure_config_dir()?;
        self.save_to(&dir.join("config.yaml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VastrowError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.worker {
            ExecutionMode::Worker
        } else {
            ExecutionMode::Inline
        }
    }

    /// Loader options; delimiter and encoding keep their defaults
    pub fn to_file_table_options(&self) -> FileTableOptions {
        FileTableOptions {
            window_rows: self.window_rows,
            max_windows: self.max_windows,
            cache_budget_bytes: self.cache_budget_mib.saturating_mul(1024 * 1024),
            prefetch_debounce: Duration::from_millis(self.debounce_ms),
            chunk_size: self.chunk_size,
            execution: self.execution_mode(),
            ..FileTableOptions::default()
        }
    }

    pub fn geometry(&self) -> ScrollGeometry {
        ScrollGeometry {
            viewport_height: self.scroller_height,
            row_height: self.row_height,
            header_height: self.header_height,
            footer_height: self.footer_height,
            safe_content_px: self.safe_content_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_loader_defaults() {
        let config = VastrowConfig::default();
        assert_eq!(config.window_rows, 1024);
        assert_eq!(config.max_windows, 16);
        assert_eq!(config.cache_budget_mib, 50);
        assert_eq!(config.debounce_ms, 25);
        let options = config.to_file_table_options();
        assert_eq!(options.cache_budget_bytes, 50 * 1024 * 1024);
        assert_eq!(options.execution, ExecutionMode::Worker);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = VastrowConfig::from_yaml("window_rows: 64\nworker: false\n").unwrap();
        assert_eq!(config.window_rows, 64);
        assert_eq!(config.max_windows, 16);
        assert_eq!(config.execution_mode(), ExecutionMode::Inline);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(VastrowConfig::from_yaml("").unwrap(), VastrowConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = VastrowConfig::from_yaml("window_rows: [1, 2").unwrap_err();
        assert!(matches!(err, VastrowError::Config(_)));
    }

    #[test]
    fn test_geometry() {
        let config = VastrowConfig {
            scroller_height: 400.0,
            footer_height: 24.0,
            ..VastrowConfig::default()
        };
        let geometry = config.geometry();
        assert_eq!(geometry.viewport_height, 400.0);
        assert_eq!(geometry.body_height(), 352.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = VastrowConfig {
            chunk_size: 4096,
            overscan: 12,
            ..VastrowConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(VastrowConfig::load_from(&path).unwrap(), config);
    }
}
