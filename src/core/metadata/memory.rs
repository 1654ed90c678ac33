//! In-memory metadata source for testing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{MetadataSource, TagMap};
use crate::error::MetadataError;

/// Serves fixed tag maps keyed by path.
///
/// Paths under a directory registered with [`InMemorySource::fail_under`]
/// make the whole batch fail, like a crashed tool would.
#[derive(Default)]
pub struct InMemorySource {
    entries: RwLock<HashMap<PathBuf, TagMap>>,
    failing: RwLock<Vec<PathBuf>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, tags: TagMap) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.into(), tags);
        }
    }

    /// Fail any batch that contains a path under `dir`
    pub fn fail_under(&self, dir: impl Into<PathBuf>) {
        if let Ok(mut failing) = self.failing.write() {
            failing.push(dir.into());
        }
    }

    fn is_failing(&self, path: &Path) -> bool {
        self.failing
            .read()
            .map(|dirs| dirs.iter().any(|d| path.starts_with(d)))
            .unwrap_or(false)
    }
}

impl MetadataSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn read_batch(&self, paths: &[PathBuf]) -> Result<HashMap<PathBuf, TagMap>, MetadataError> {
        if let Some(path) = paths.iter().find(|p| self.is_failing(p)) {
            return Err(MetadataError::UnparseableOutput {
                reason: format!("simulated failure for {}", path.display()),
            });
        }

        let entries = self.entries.read().map_err(|_| MetadataError::UnparseableOutput {
            reason: "metadata store poisoned".to_string(),
        })?;

        Ok(paths
            .iter()
            .filter_map(|p| entries.get(p).map(|tags| (p.clone(), tags.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn returns_only_known_paths() {
        let source = InMemorySource::new();
        source.insert("/r/a.jpg", [("IPTC:City", json!("Bern"))].into_iter().collect());

        let result = source
            .read_batch(&[PathBuf::from("/r/a.jpg"), PathBuf::from("/r/b.jpg")])
            .unwrap();

        assert_eq!(result.len(), 1);
    }

    #[test]
    fn failing_directory_fails_the_batch() {
        let source = InMemorySource::new();
        source.fail_under("/rolls/7");

        assert!(source.read_batch(&[PathBuf::from("/rolls/7/a.jpg")]).is_err());
        assert!(source.read_batch(&[PathBuf::from("/rolls/8/a.jpg")]).is_ok());
    }
}
