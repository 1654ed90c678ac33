//! Directory walking implementation using walkdir.

use super::{filter::FileFilter, FileKind, RollFiles, RollScanner, ScannedFile};
use crate::core::roll::RollId;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Export extensions (None = jpg, jpeg, png)
    pub export_extensions: Option<Vec<String>>,
    /// RAW extensions (None = arw, dng)
    pub raw_extensions: Option<Vec<String>>,
    /// Directory name fragments to skip (None = 5mb, 5mp)
    pub skip_dir_markers: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: None,
            export_extensions: None,
            raw_extensions: None,
            skip_dir_markers: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: FileFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = FileFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.export_extensions {
            filter = filter.with_export_extensions(extensions.clone());
        }
        if let Some(ref extensions) = config.raw_extensions {
            filter = filter.with_raw_extensions(extensions.clone());
        }
        if let Some(ref markers) = config.skip_dir_markers {
            filter = filter.with_skip_markers(markers.clone());
        }

        Self { config, filter }
    }

    /// List files of one kind below a single root
    fn scan_directory(
        &self,
        root: &Path,
        kind: FileKind,
        events: &EventSender,
    ) -> Result<(Vec<ScannedFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let entries = walker.into_iter().filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_type().is_dir() || !self.filter.skip_directory(entry.path())
        });

        for entry_result in entries {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        continue;
                    }

                    let path = entry.path();
                    if self.filter.classify(path) != Some(kind) {
                        continue;
                    }

                    match entry.metadata() {
                        Ok(metadata) => files.push(ScannedFile::new(path, metadata.len())),
                        Err(e) => {
                            let error = ScanError::ReadDirectory {
                                path: path.to_path_buf(),
                                source: std::io::Error::other(e.to_string()),
                            };
                            report(events, &error, path);
                            errors.push(error);
                        }
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    report(events, &error, &path);
                    errors.push(error);
                }
            }
        }

        Ok((files, errors))
    }
}

fn report(events: &EventSender, error: &ScanError, path: &Path) {
    tracing::warn!(path = %path.display(), "{}", error);
    events.send(Event::Scan(ScanEvent::Error {
        path: path.to_path_buf(),
        message: error.to_string(),
    }));
}

impl RollScanner for WalkDirScanner {
    fn list(
        &self,
        roll: RollId,
        export_dirs: &[PathBuf],
        raw_dirs: &[PathBuf],
        events: &EventSender,
    ) -> Result<RollFiles, ScanError> {
        let mut paths = export_dirs.to_vec();
        paths.extend(raw_dirs.iter().cloned());
        events.send(Event::Scan(ScanEvent::Started { roll, paths }));

        let mut result = RollFiles::default();

        for dir in export_dirs {
            let (files, errors) = self.scan_directory(dir, FileKind::Export, events)?;
            result.exports.extend(files);
            result.errors.extend(errors);
        }

        for dir in raw_dirs {
            match self.scan_directory(dir, FileKind::Raw, events) {
                Ok((files, errors)) => {
                    result.raws.extend(files);
                    result.errors.extend(errors);
                }
                Err(e) => {
                    report(events, &e, dir);
                    result.errors.push(e);
                }
            }
        }

        result.exports.sort_by(|a, b| a.path.cmp(&b.path));
        result.raws.sort_by(|a, b| a.path.cmp(&b.path));

        events.send(Event::Scan(ScanEvent::Completed {
            roll,
            exports: result.exports.len(),
            raws: result.raws.len(),
        }));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    fn list(scanner: &WalkDirScanner, exports: &Path, raws: &[PathBuf]) -> RollFiles {
        scanner
            .list(RollId(1), &[exports.to_path_buf()], raws, &null_sender())
            .unwrap()
    }

    #[test]
    fn empty_directory_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let files = list(&scanner, temp_dir.path(), &[]);

        assert!(files.exports.is_empty());
        assert!(files.raws.is_empty());
        assert!(files.errors.is_empty());
    }

    #[test]
    fn separates_exports_and_raws() {
        let exports = TempDir::new().unwrap();
        let raws = TempDir::new().unwrap();
        create_file(exports.path(), "22-06-12 Gold 200 Zurich 1.jpg");
        create_file(exports.path(), "22-06-12 Gold 200 Zurich 2.png");
        create_file(exports.path(), "notes.txt");
        create_file(raws.path(), "DSC00001.ARW");
        create_file(raws.path(), "DSC00002.dng");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let files = list(&scanner, exports.path(), &[raws.path().to_path_buf()]);

        assert_eq!(files.exports.len(), 2);
        assert_eq!(files.raws.len(), 2);
        assert_eq!(files.raws[0].file_name, "DSC00001.ARW");
        assert_eq!(files.exports[0].size, 4);
    }

    #[test]
    fn skips_downsized_export_folders() {
        let exports = TempDir::new().unwrap();
        let small = exports.path().join("jpg 5mb");
        fs::create_dir(&small).unwrap();
        create_file(exports.path(), "a 1.jpg");
        create_file(&small, "a 1.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let files = list(&scanner, exports.path(), &[]);

        assert_eq!(files.exports.len(), 1);
        assert_eq!(files.exports[0].path, exports.path().join("a 1.jpg"));
    }

    #[test]
    fn traverses_nested_directories() {
        let exports = TempDir::new().unwrap();
        let nested = exports.path().join("edits");
        fs::create_dir(&nested).unwrap();
        create_file(exports.path(), "a 1.jpg");
        create_file(&nested, "a 2.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        assert_eq!(list(&scanner, exports.path(), &[]).exports.len(), 2);
    }

    #[test]
    fn missing_export_directory_is_an_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.list(
            RollId(1),
            &[PathBuf::from("/nonexistent/path/12345")],
            &[],
            &null_sender(),
        );

        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[test]
    fn missing_raw_directory_is_recorded() {
        let exports = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let files = list(&scanner, exports.path(), &[PathBuf::from("/nonexistent/raw/12345")]);

        assert_eq!(files.errors.len(), 1);
    }
}
