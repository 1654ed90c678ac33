//! # Scanner Module
//!
//! Lists the export and RAW files of a roll.
//!
//! ## Recognized Files
//! - Exports: `.jpg`, `.jpeg`, `.png`
//! - RAW originals: `.arw`, `.dng`
//!
//! Hidden entries and downsized export folders (names containing `5mb` or
//! `5mp`) are skipped. Both lists are configurable through
//! [`ArchiveConfig`](crate::config::ArchiveConfig).
//!
//! ## Example
//! ```rust,ignore
//! use film_roll_archive::core::scanner::{RollScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let files = scanner.list(RollId(72), &export_dirs, &raw_dirs, &null_sender())?;
//! ```

mod filter;
mod walker;

pub use filter::FileFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::roll::RollId;
use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A listed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub file_name: String,
    /// File size in bytes
    pub size: u64,
}

impl ScannedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let file_name = file_name_of(&path);
        Self { path, file_name, size }
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// What a listed file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Export,
    Raw,
}

/// Everything listed for one roll
#[derive(Debug, Default)]
pub struct RollFiles {
    /// Export files, sorted by path
    pub exports: Vec<ScannedFile>,
    /// RAW files, sorted by path
    pub raws: Vec<ScannedFile>,
    /// Entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for roll file listers
///
/// Implement this trait to feed the pipeline from somewhere other than the
/// local file system.
pub trait RollScanner: Send + Sync {
    /// List a roll's export and RAW directories.
    ///
    /// A missing export directory is an error; a missing RAW directory is
    /// recorded in [`RollFiles::errors`].
    fn list(
        &self,
        roll: RollId,
        export_dirs: &[PathBuf],
        raw_dirs: &[PathBuf],
        events: &EventSender,
    ) -> Result<RollFiles, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanned_file_takes_name_from_path() {
        let file = ScannedFile::new("/rolls/2/22-06-12 Gold 200 Zurich 4.jpg", 10);
        assert_eq!(file.file_name, "22-06-12 Gold 200 Zurich 4.jpg");
        assert_eq!(file.size, 10);
    }
}
