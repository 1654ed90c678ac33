//! Pipeline execution implementation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::ArchiveConfig;
use crate::core::aggregate::{aggregate_roll, resolve_stock, ReferenceTables};
use crate::core::exposure::{build_exposure, ExposureId, RecordContext};
use crate::core::grouping::resolve_duplicates;
use crate::core::metadata::{ExifToolSource, MetadataSource, RollMetadataCache};
use crate::core::raw_match::{match_raw_files, RawFile};
use crate::core::reindex::reindex;
use crate::core::roll::{Roll, RollId};
use crate::core::scanner::{RollFiles, RollScanner, WalkDirScanner};
use crate::error::{ArchiveError, ConfigError};
use crate::events::{
    null_sender, DiagnosticKind, Event, EventSender, PipelineEvent, PipelineSummary, RollEvent,
    RollLog, RollStage, Subject,
};

/// One roll to process, as listed in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollInput {
    pub id: RollId,
    pub name: String,
    #[serde(default)]
    pub export_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub raw_dirs: Vec<PathBuf>,
}

impl RollInput {
    /// Load a JSON array of rolls
    pub fn load_manifest(path: &Path) -> Result<Vec<RollInput>, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// A roll that was aborted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollFailure {
    pub roll: RollId,
    pub message: String,
}

/// Result of pipeline execution
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    /// Identifies this run in logs and exports
    pub run_id: Uuid,
    /// Resolved rolls, in manifest order
    pub rolls: Vec<Roll>,
    /// Rolls excluded because of a fatal roll error
    pub failures: Vec<RollFailure>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn roll(&self, id: RollId) -> Option<&Roll> {
        self.rolls.iter().find(|r| r.id == id)
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            rolls_processed: self.rolls.len(),
            rolls_failed: self.failures.len(),
            total_masters: self.rolls.iter().map(Roll::master_count).sum(),
            total_copies: self.rolls.iter().map(Roll::copy_count).sum(),
            unmatched_raws: self.rolls.iter().map(|r| r.raw_report.unmatched.len()).sum(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: ArchiveConfig,
    references: Arc<ReferenceTables>,
    source: Option<Arc<dyn MetadataSource>>,
    scanner: Option<Box<dyn RollScanner>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: ArchiveConfig::default(),
            references: Arc::new(ReferenceTables::default()),
            source: None,
            scanner: None,
        }
    }

    /// Set the archive configuration
    pub fn config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the stock and camera tables
    pub fn references(mut self, references: Arc<ReferenceTables>) -> Self {
        self.references = references;
        self
    }

    /// Set the metadata source (default: exiftool on PATH)
    pub fn metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the roll scanner (default: walkdir with the config's filters)
    pub fn scanner(mut self, scanner: Box<dyn RollScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let scanner = self
            .scanner
            .unwrap_or_else(|| Box::new(WalkDirScanner::new(self.config.scan_config())));
        Pipeline {
            source: self.source.unwrap_or_else(|| Arc::new(ExifToolSource::new())),
            config: self.config,
            references: self.references,
            scanner,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The roll resolution pipeline
pub struct Pipeline {
    config: ArchiveConfig,
    references: Arc<ReferenceTables>,
    source: Arc<dyn MetadataSource>,
    scanner: Box<dyn RollScanner>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self, rolls: &[RollInput]) -> Result<PipelineResult, ArchiveError> {
        self.run_with_events(rolls, &null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Only an invalid manifest fails the run; roll failures end up in
    /// [`PipelineResult::failures`].
    pub fn run_with_events(
        &self,
        rolls: &[RollInput],
        events: &EventSender,
    ) -> Result<PipelineResult, ArchiveError> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();

        let mut seen = BTreeSet::new();
        for input in rolls {
            if !seen.insert(input.id) {
                return Err(ConfigError::DuplicateRoll { roll: input.id }.into());
            }
        }

        tracing::info!(run = %run_id, rolls = rolls.len(), source = self.source.name(), "Pipeline started");
        events.send(Event::Pipeline(PipelineEvent::Started {
            total_rolls: rolls.len(),
        }));

        let outcomes: Vec<(RollId, Result<Roll, ArchiveError>)> = rolls
            .par_iter()
            .map(|input| (input.id, self.process_roll(input, events)))
            .collect();

        let mut resolved = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (roll, outcome) in outcomes {
            match outcome {
                Ok(r) => resolved.push(r),
                Err(e) => {
                    let error = ArchiveError::Roll {
                        roll,
                        source: Box::new(e),
                    };
                    tracing::error!(run = %run_id, roll = roll.0, "{}", error);
                    events.send(Event::Roll(RollEvent::Failed {
                        roll,
                        message: error.to_string(),
                    }));
                    failures.push(RollFailure {
                        roll,
                        message: error.to_string(),
                    });
                }
            }
        }

        let result = PipelineResult {
            run_id,
            rolls: resolved,
            failures,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        let summary = result.summary();
        tracing::info!(
            run = %run_id,
            processed = summary.rolls_processed,
            failed = summary.rolls_failed,
            duration_ms = summary.duration_ms,
            "Pipeline completed"
        );
        events.send(Event::Pipeline(PipelineEvent::Completed { summary }));

        Ok(result)
    }

    fn process_roll(&self, input: &RollInput, events: &EventSender) -> Result<Roll, ArchiveError> {
        stage(events, input.id, RollStage::Listing);
        let files = self
            .scanner
            .list(input.id, &input.export_dirs, &input.raw_dirs, events)?;
        self.resolve_roll(input.id, &input.name, files, events)
    }

    /// Resolve an already listed roll: metadata through aggregation
    pub fn resolve_roll(
        &self,
        id: RollId,
        name: &str,
        files: RollFiles,
        events: &EventSender,
    ) -> Result<Roll, ArchiveError> {
        let mut log = RollLog::new(id, events.clone());
        for error in &files.errors {
            log.warn(DiagnosticKind::ScanProblem, Subject::roll(), error.to_string());
        }
        events.send(Event::Roll(RollEvent::Started {
            roll: id,
            files: files.exports.len() + files.raws.len(),
        }));

        stage(events, id, RollStage::Metadata);
        let paths: Vec<PathBuf> = files.exports.iter().map(|f| f.path.clone()).collect();
        let cache = RollMetadataCache::load(self.source.as_ref(), &paths)?;

        stage(events, id, RollStage::Records);
        let policy = self.config.policy(id);
        let ctx = RecordContext {
            stock_aliases: &self.config.stock_aliases,
            raw_extension: policy.raw_extension.as_deref(),
        };
        let exposures = files
            .exports
            .iter()
            .enumerate()
            .map(|(i, file)| build_exposure(ExposureId(i), file, cache.get(&file.path), &ctx, &mut log))
            .collect();
        let raws = files.raws.into_iter().map(RawFile::from).collect();
        let mut roll = Roll::new(id, name, exposures, raws);
        drop(cache);

        let stock = resolve_stock(&roll, &self.references, &mut log);

        stage(events, id, RollStage::Grouping);
        resolve_duplicates(&mut roll, stock.film_kind(), &policy, &mut log);

        stage(events, id, RollStage::Reindexing);
        reindex(&mut roll, &mut log);

        stage(events, id, RollStage::RawMatching);
        match_raw_files(&mut roll, &mut log);

        stage(events, id, RollStage::Aggregating);
        aggregate_roll(&mut roll, &self.references, &stock, &mut log);

        roll.diagnostics = log.into_entries();

        tracing::info!(
            roll = id.0,
            masters = roll.master_count(),
            copies = roll.copy_count(),
            diagnostics = roll.diagnostics.len(),
            "Roll resolved"
        );
        events.send(Event::Roll(RollEvent::Completed {
            roll: id,
            masters: roll.master_count(),
            copies: roll.copy_count(),
            unmatched_raws: roll.raw_report.unmatched.len(),
        }));

        Ok(roll)
    }
}

fn stage(events: &EventSender, roll: RollId, stage: RollStage) {
    tracing::debug!(roll = roll.0, stage = %stage, "Stage");
    events.send(Event::Roll(RollEvent::StageChanged { roll, stage }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exposure::keys;
    use crate::core::metadata::{InMemorySource, TagMap};
    use crate::events::EventChannel;
    use serde_json::json;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn tags(date: &str, raw: &str) -> TagMap {
        [
            (keys::DATE_EXPOSED, json!(date)),
            (keys::PRESERVED_FILE_NAME, json!(raw)),
        ]
        .into_iter()
        .collect()
    }

    fn write_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
        path
    }

    fn roll_dir(root: &TempDir, id: u32, source: &InMemorySource) -> RollInput {
        let dir = root.path().join(format!("{}_roll", id));
        let jpg = dir.join("jpg");
        let raw = dir.join("raw");
        let a = write_file(&jpg, "a 1.jpg", 200);
        let b = write_file(&jpg, "a 1 bw.jpg", 100);
        let c = write_file(&jpg, "a 2.jpg", 200);
        write_file(&raw, "A.ARW", 10);
        write_file(&raw, "C.ARW", 10);
        source.insert(a, tags("2023:04:01 09:00:00", "A.ARW"));
        source.insert(b, tags("2023:04:01 09:00:00", "A.ARW"));
        source.insert(c, tags("2023:04:01 10:00:00", "C.ARW"));
        RollInput {
            id: RollId(id),
            name: format!("{}_roll", id),
            export_dirs: vec![jpg],
            raw_dirs: vec![raw],
        }
    }

    #[test]
    fn pipeline_resolves_rolls_from_disk() {
        let root = TempDir::new().unwrap();
        let source = Arc::new(InMemorySource::new());
        let input = roll_dir(&root, 7, &source);

        let pipeline = Pipeline::builder().metadata_source(source).build();
        let result = pipeline.run(&[input]).unwrap();

        assert!(result.failures.is_empty());
        let roll = result.roll(RollId(7)).unwrap();
        assert_eq!(roll.master_count(), 2);
        assert_eq!(roll.copy_count(), 1);
        assert_eq!(roll.raw_report.bindings.len(), 2);
        assert!(roll.raw_report.unmatched.is_empty());
        assert!(!roll.diagnostics.is_empty());
    }

    #[test]
    fn failing_roll_is_isolated() {
        let root = TempDir::new().unwrap();
        let source = Arc::new(InMemorySource::new());
        let good = roll_dir(&root, 1, &source);
        let bad = roll_dir(&root, 2, &source);
        source.fail_under(&bad.export_dirs[0]);

        let (sender, receiver) = EventChannel::new();
        let pipeline = Pipeline::builder().metadata_source(source).build();
        let result = pipeline.run_with_events(&[good, bad], &sender).unwrap();
        drop(sender);

        assert_eq!(result.rolls.len(), 1);
        assert_eq!(result.rolls[0].id, RollId(1));
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].roll, RollId(2));

        let failed_events = receiver
            .iter()
            .filter(|e| matches!(e, Event::Roll(RollEvent::Failed { .. })))
            .count();
        assert_eq!(failed_events, 1);
    }

    #[test]
    fn missing_export_directory_fails_the_roll() {
        let pipeline = Pipeline::builder()
            .metadata_source(Arc::new(InMemorySource::new()))
            .build();
        let input = RollInput {
            id: RollId(3),
            name: "3_missing".to_string(),
            export_dirs: vec![PathBuf::from("/definitely/not/here")],
            raw_dirs: vec![],
        };

        let result = pipeline.run(&[input]).unwrap();

        assert!(result.rolls.is_empty());
        assert!(result.failures[0].message.contains("Directory not found"));
    }

    #[test]
    fn missing_raw_directory_is_recorded_on_the_roll() {
        let root = TempDir::new().unwrap();
        let source = Arc::new(InMemorySource::new());
        let mut input = roll_dir(&root, 8, &source);
        let missing = root.path().join("8_roll").join("tif");
        input.raw_dirs = vec![missing.clone()];

        let pipeline = Pipeline::builder().metadata_source(source).build();
        let result = pipeline.run(&[input]).unwrap();

        assert!(result.failures.is_empty());
        let audit = result.roll(RollId(8)).unwrap().audit();
        assert_eq!(audit.scan_problems.len(), 1);
        assert!(audit.scan_problems[0].contains(&missing.display().to_string()));
        assert!(!audit.is_clean());
    }

    #[test]
    fn duplicate_roll_ids_are_rejected() {
        let input = RollInput {
            id: RollId(4),
            name: "4".to_string(),
            export_dirs: vec![],
            raw_dirs: vec![],
        };
        let pipeline = Pipeline::builder()
            .metadata_source(Arc::new(InMemorySource::new()))
            .build();

        let result = pipeline.run(&[input.clone(), input]);

        assert!(matches!(
            result,
            Err(ArchiveError::Config(ConfigError::DuplicateRoll { .. }))
        ));
    }

    #[test]
    fn manifest_parses_roll_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rolls.json");
        fs::write(
            &path,
            r#"[{ "id": 72, "name": "72_23-09-07 F3 P400 Flims",
                  "export_dirs": ["/film/72/jpg"], "raw_dirs": ["/film/72/raw"] }]"#,
        )
        .unwrap();

        let rolls = RollInput::load_manifest(&path).unwrap();

        assert_eq!(rolls.len(), 1);
        assert_eq!(rolls[0].id, RollId(72));
        assert_eq!(rolls[0].raw_dirs, vec![PathBuf::from("/film/72/raw")]);
    }
}
