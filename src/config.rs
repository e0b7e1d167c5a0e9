//! Tracker configuration.

use crate::error::{Result, SpinnerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Options recognised by [`ProcessTracker`](crate::ProcessTracker).
///
/// JSON keys are camelCase (`freezeSize`, `debug`, `eventPrefix`, `spinner`);
/// any key left out takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpinnerConfig {
    /// Lock the host footprint while the overlay is showing (default: true)
    pub freeze_size: bool,
    /// Trace every operation to the debug log (default: false)
    pub debug: bool,
    /// Prefix for emitted event names (default: "")
    pub event_prefix: String,
    /// Template drawn inside the overlay; the view picks its own when unset
    pub spinner: Option<String>,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            freeze_size: true,
            debug: false,
            event_prefix: String::new(),
            spinner: None,
        }
    }
}

impl SpinnerConfig {
    /// Load from a JSON file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SpinnerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SpinnerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Default config file location
pub fn get_config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("advanced-spinner")
        .join("config.json")
}
