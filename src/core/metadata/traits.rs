//! Metadata source trait definition.

use super::TagMap;
use crate::error::MetadataError;
use std::collections::HashMap;
use std::path::PathBuf;

/// Trait for metadata backends
pub trait MetadataSource: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Read tags for every path of one roll in a single batch.
    ///
    /// Paths the source has nothing for are simply missing from the result.
    /// An `Err` means the source itself failed and the roll cannot proceed.
    fn read_batch(&self, paths: &[PathBuf]) -> Result<HashMap<PathBuf, TagMap>, MetadataError>;
}
