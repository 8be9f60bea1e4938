//! Editor configuration
//!
//! Persistent settings for the editing core:
//! - Undo history depth
//! - Continuous-control merge window
//! - Curve simplification tolerance

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rf_core::{RfError, RfResult};

use crate::undo::MergePolicy;

/// Default undo depth
pub const DEFAULT_MAX_UNDO_HISTORY: usize = 500;

/// Default window for coalescing fader drags (ms)
pub const DEFAULT_MERGE_WINDOW_MS: u64 = 500;

/// Default simplification tolerance (normalized units)
pub const DEFAULT_SIMPLIFY_THRESHOLD: f64 = 0.01;

/// Editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo/redo settings
    pub history: HistoryConfig,
    /// Curve thinning settings
    pub simplify: SimplifyConfig,
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo steps kept
    pub max_undo_history: usize,
    /// Continuous edits within this many ms of a gesture's first edit merge
    pub merge_window_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_history: DEFAULT_MAX_UNDO_HISTORY,
            merge_window_ms: DEFAULT_MERGE_WINDOW_MS,
        }
    }
}

impl HistoryConfig {
    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy::new(Duration::from_millis(self.merge_window_ms))
    }
}

/// Curve simplification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Tolerance used when the caller does not pick one
    pub default_threshold: f64,
    /// Floor applied to tolerances chosen through an `EditContext`
    pub min_threshold: f64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_SIMPLIFY_THRESHOLD,
            min_threshold: crate::simplify::MIN_THRESHOLD,
        }
    }
}

impl SimplifyConfig {
    /// Apply the floor to a requested tolerance
    pub fn effective_threshold(&self, threshold: f64) -> f64 {
        threshold.max(self.min_threshold.max(crate::simplify::MIN_THRESHOLD))
    }
}

impl EditorConfig {
    /// Load configuration from the standard location, falling back to defaults
    pub fn load() -> Self {
        Self::load_or_default(Self::default_path())
    }

    /// Load configuration from a file
    pub fn load_from<P: AsRef<Path>>(path: P) -> RfResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| RfError::Serialization(e.to_string()))
    }

    /// Load configuration, using defaults when the file is missing or malformed
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(config) => config,
            Err(RfError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Ignoring editor config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> RfResult<()> {
        self.save_to(Self::default_path())
    }

    /// Save configuration to a file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> RfResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json =
            serde_json::to_string_pretty(self).map_err(|e| RfError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Get default configuration file path
    pub fn default_path() -> PathBuf {
        let base = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .map(|h| h.join("Library/Application Support/ReelForge"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("ReelForge"))
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            // Linux/other
            dirs::config_dir()
                .map(|d| d.join("reelforge"))
                .unwrap_or_else(|| PathBuf::from("."))
        };
        base.join("editor.json")
    }
}
