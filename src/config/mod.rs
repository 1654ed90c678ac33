//! # Config Module
//!
//! Archive configuration loaded from a JSON file.
//!
//! ```json
//! {
//!   "overrides": {
//!     "6":  { "skip_grouping": true, "note": "bracketed scans share timestamps" },
//!     "12": { "skip_grouping": true, "raw_extension": "dng" }
//!   },
//!   "stock_aliases": { "Gold 200 OM Accura": "Gold 200" }
//! }
//! ```
//!
//! Every field is optional. A missing file at the default location means
//! defaults; a missing file at an explicit path is an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::roll::RollId;
use crate::core::scanner::ScanConfig;
use crate::error::ConfigError;

const APP_DIR: &str = "film-roll-archive";
const CONFIG_FILE: &str = "config.json";

/// Per-roll exceptions to the normal processing rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RollPolicy {
    /// Every exposure becomes its own master
    pub skip_grouping: bool,
    /// Extension forced onto expected RAW file names
    pub raw_extension: Option<String>,
    /// Free text, shown when the override is applied
    pub note: Option<String>,
}

/// Archive-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub overrides: BTreeMap<RollId, RollPolicy>,
    /// Scene tag rewrites applied before stock lookup
    pub stock_aliases: BTreeMap<String, String>,
    pub export_extensions: Vec<String>,
    pub raw_extensions: Vec<String>,
    /// Directory name fragments that mark folders to skip
    pub skip_dir_markers: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            stock_aliases: BTreeMap::new(),
            export_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            raw_extensions: vec!["arw".into(), "dng".into()],
            skip_dir_markers: vec!["5mb".into(), "5mp".into()],
        }
    }
}

impl ArchiveConfig {
    /// `<config dir>/film-roll-archive/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// Only the default location may be absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    fn from_json(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Check values that deserialize but make no sense
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        };

        if self.export_extensions.is_empty() {
            return Err(invalid("export_extensions must not be empty".into()));
        }
        if self.raw_extensions.is_empty() {
            return Err(invalid("raw_extensions must not be empty".into()));
        }
        for (roll, policy) in &self.overrides {
            if let Some(ext) = &policy.raw_extension {
                let ext = ext.trim_start_matches('.');
                if ext.is_empty() || ext.contains(['/', '\\', '.']) {
                    return Err(invalid(format!("roll {}: invalid raw_extension '{}'", roll, ext)));
                }
            }
        }
        Ok(())
    }

    /// Policy for a roll; rolls without an override get the default policy
    pub fn policy(&self, roll: RollId) -> RollPolicy {
        self.overrides.get(&roll).cloned().unwrap_or_default()
    }

    /// Scanner settings derived from this configuration
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            export_extensions: Some(self.export_extensions.clone()),
            raw_extensions: Some(self.raw_extensions.clone()),
            skip_dir_markers: Some(self.skip_dir_markers.clone()),
            ..ScanConfig::default()
        }
    }
}
