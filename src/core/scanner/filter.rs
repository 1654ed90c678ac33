//! File filtering logic for the scanner.

use super::FileKind;
use std::collections::HashSet;
use std::path::Path;

/// Decides which files are exports or RAWs and which directories to skip
#[derive(Debug, Clone)]
pub struct FileFilter {
    export_extensions: HashSet<String>,
    raw_extensions: HashSet<String>,
    /// Directory name fragments that mark folders to skip
    skip_dir_markers: Vec<String>,
    include_hidden: bool,
}

impl FileFilter {
    /// Create a filter with the default extensions and markers
    pub fn new() -> Self {
        Self {
            export_extensions: ["jpg", "jpeg", "png"].iter().map(|s| s.to_string()).collect(),
            raw_extensions: ["arw", "dng"].iter().map(|s| s.to_string()).collect(),
            skip_dir_markers: vec!["5mb".to_string(), "5mp".to_string()],
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_export_extensions(mut self, extensions: Vec<String>) -> Self {
        self.export_extensions = normalize(extensions);
        self
    }

    pub fn with_raw_extensions(mut self, extensions: Vec<String>) -> Self {
        self.raw_extensions = normalize(extensions);
        self
    }

    pub fn with_skip_markers(mut self, markers: Vec<String>) -> Self {
        self.skip_dir_markers = markers.into_iter().map(|m| m.to_lowercase()).collect();
        self
    }

    /// Classify a file, `None` when it should be ignored
    pub fn classify(&self, path: &Path) -> Option<FileKind> {
        if self.is_hidden(path) {
            return None;
        }

        let ext = path.extension()?.to_str()?.to_lowercase();
        if self.export_extensions.contains(&ext) {
            Some(FileKind::Export)
        } else if self.raw_extensions.contains(&ext) {
            Some(FileKind::Raw)
        } else {
            None
        }
    }

    /// Whether a directory below a scan root should be skipped
    pub fn skip_directory(&self, path: &Path) -> bool {
        if self.is_hidden(path) {
            return true;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_lowercase();
        self.skip_dir_markers.iter().any(|marker| name.contains(marker))
    }

    fn is_hidden(&self, path: &Path) -> bool {
        !self.include_hidden
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(extensions: Vec<String>) -> HashSet<String> {
    extensions
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect()
}
