//! Roll builders shared by unit tests.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::exposure::{build_exposure, ExposureId, RecordContext};
use crate::core::metadata::TagMap;
use crate::core::raw_match::RawFile;
use crate::core::roll::{Roll, RollId};
use crate::core::scanner::ScannedFile;
use crate::events::{null_sender, RollLog};

pub(crate) struct RollFixture {
    id: RollId,
    exports: Vec<(ScannedFile, TagMap)>,
    raws: Vec<ScannedFile>,
}

impl RollFixture {
    pub fn new(id: u32) -> Self {
        Self {
            id: RollId(id),
            exports: Vec::new(),
            raws: Vec::new(),
        }
    }

    fn dir(&self) -> PathBuf {
        PathBuf::from("/rolls").join(self.id.to_string())
    }

    /// Add an export file; an empty tag list means no metadata
    pub fn export(mut self, name: &str, size: u64, tags: &[(&str, Value)]) -> Self {
        let path = self.dir().join("jpg").join(name);
        let map: TagMap = tags.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        self.exports.push((ScannedFile::new(path, size), map));
        self
    }

    pub fn raw(mut self, name: &str, size: u64) -> Self {
        let path = self.dir().join("raw").join(name);
        self.raws.push(ScannedFile::new(path, size));
        self
    }

    pub fn build(self) -> (Roll, RollLog) {
        let mut log = RollLog::new(self.id, null_sender());
        let aliases = BTreeMap::new();
        let ctx = RecordContext {
            stock_aliases: &aliases,
            raw_extension: None,
        };

        let exposures = self
            .exports
            .iter()
            .enumerate()
            .map(|(i, (file, tags))| build_exposure(ExposureId(i), file, Some(tags), &ctx, &mut log))
            .collect();
        let raws = self.raws.into_iter().map(RawFile::from).collect();

        (Roll::new(self.id, format!("{}_fixture", self.id), exposures, raws), log)
    }
}
