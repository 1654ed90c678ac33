//! Metadata cache scoped to one roll pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{MetadataSource, TagMap};
use crate::error::MetadataError;

/// Tag maps for every file of a roll, fetched in one batch.
///
/// Created inside the roll task and dropped with it; nothing is shared
/// between rolls or runs.
#[derive(Debug, Default)]
pub struct RollMetadataCache {
    entries: HashMap<PathBuf, TagMap>,
}

impl RollMetadataCache {
    /// Fetch tags for all paths with a single call to the source
    pub fn load(source: &dyn MetadataSource, paths: &[PathBuf]) -> Result<Self, MetadataError> {
        let entries = source.read_batch(paths)?;
        tracing::debug!(
            source = source.name(),
            requested = paths.len(),
            returned = entries.len(),
            "Loaded roll metadata"
        );
        Ok(Self { entries })
    }

    pub fn get(&self, path: &Path) -> Option<&TagMap> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
