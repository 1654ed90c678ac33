//! Integration tests for roll resolution.
//!
//! These tests drive the pipeline end to end with an in-memory metadata
//! source and verify:
//! - Master selection (grayscale, panorama, resolution)
//! - Dense reindexing and index inheritance
//! - RAW binding and unmatched reporting
//! - Roll failure isolation
//! - Idempotence and input-order independence

use assert_fs::prelude::*;
use assert_fs::TempDir;
use film_roll_archive::config::{ArchiveConfig, RollPolicy};
use film_roll_archive::core::aggregate::{CameraRecord, ReferenceTables, StockRecord};
use film_roll_archive::core::exposure::keys;
use film_roll_archive::core::grouping::{resolve_duplicates, FilmKind, SelectionReason};
use film_roll_archive::core::metadata::{InMemorySource, TagMap};
use film_roll_archive::core::pipeline::{Pipeline, RollInput};
use film_roll_archive::core::raw_match::{match_raw_files, MismatchReason};
use film_roll_archive::core::reindex::reindex;
use film_roll_archive::core::roll::{Roll, RollId};
use film_roll_archive::core::scanner::{RollFiles, ScannedFile};
use film_roll_archive::events::{null_sender, RollLog};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

fn references() -> Arc<ReferenceTables> {
    let stock = |id: &str, color: bool| StockRecord {
        id: id.to_string(),
        code: None,
        manufacturer: "Kodak".to_string(),
        name: id.to_string(),
        box_speed: 400,
        process: if color { "C41" } else { "BW" }.to_string(),
        is_color: color,
        is_black_and_white: !color,
        is_infrared: false,
        is_negative: true,
        is_slide: false,
    };
    let tables = ReferenceTables::new(
        vec![stock("Portra 400", true), stock("Tri-X 400", false)],
        vec![CameraRecord {
            id: "F3".to_string(),
            brand: "Nikon".to_string(),
            model: "F3".to_string(),
            film_type: Some("135".to_string()),
            film_format: Some("35mm".to_string()),
        }],
    )
    .unwrap();
    Arc::new(tables)
}

/// Tags of one frame shot on Portra 400 with a Nikon F3
fn frame(timestamp: &str) -> TagMap {
    let mut tags = TagMap::new();
    tags.insert(keys::DATE_EXPOSED, timestamp);
    tags.insert(keys::SCENE, "Portra 400");
    tags.insert(keys::CAMERA_MAKE, "Nikon");
    tags.insert(keys::CAMERA_MODEL, "F3");
    tags
}

fn with(mut tags: TagMap, key: &str, value: serde_json::Value) -> TagMap {
    tags.insert(key, value);
    tags
}

/// In-memory roll: files are never touched, only their tags are served
struct TestRoll {
    id: RollId,
    source: Arc<InMemorySource>,
    exports: Vec<ScannedFile>,
    raws: Vec<ScannedFile>,
}

impl TestRoll {
    fn new(id: u32) -> Self {
        Self {
            id: RollId(id),
            source: Arc::new(InMemorySource::new()),
            exports: Vec::new(),
            raws: Vec::new(),
        }
    }

    fn dir(&self) -> PathBuf {
        PathBuf::from("/film").join(format!("{}_test", self.id))
    }

    fn export(mut self, name: &str, size: u64, tags: TagMap) -> Self {
        let path = self.dir().join("jpg").join(name);
        self.source.insert(path.clone(), tags);
        self.exports.push(ScannedFile::new(path, size));
        self
    }

    fn raw(mut self, name: &str) -> Self {
        let path = self.dir().join("raw").join(name);
        self.raws.push(ScannedFile::new(path, 25_000_000));
        self
    }

    fn resolve_with(&self, config: ArchiveConfig, exports: Vec<ScannedFile>) -> Roll {
        let pipeline = Pipeline::builder()
            .config(config)
            .references(references())
            .metadata_source(self.source.clone())
            .build();
        let files = RollFiles {
            exports,
            raws: self.raws.clone(),
            errors: Vec::new(),
        };
        pipeline
            .resolve_roll(self.id, &format!("{}_test", self.id), files, &null_sender())
            .unwrap()
    }

    fn resolve(&self) -> Roll {
        self.resolve_with(ArchiveConfig::default(), self.exports.clone())
    }
}

fn master_names(roll: &Roll) -> Vec<String> {
    roll.masters().map(|e| e.file_name.clone()).collect()
}

#[test]
fn color_version_wins_over_grayscale_conversion() {
    let roll = TestRoll::new(1)
        .export(
            "23-09-07 - 4 - Flims bw.jpg",
            9_000_000,
            with(frame("2023:09:07 14:22:10"), keys::GRAYSCALE, json!(true)),
        )
        .export("23-09-07 - 4 - Flims.jpg", 8_000_000, frame("2023:09:07 14:22:10"))
        .resolve();

    let master = roll.find("23-09-07 - 4 - Flims.jpg").unwrap();
    let gray = roll.find("23-09-07 - 4 - Flims bw.jpg").unwrap();

    assert!(master.is_master);
    assert_eq!(master.copies, vec![gray.id]);
    assert_eq!(gray.original, Some(master.id));
    assert_eq!(roll.groups[0].reason, SelectionReason::ColorOverGrayscale);
}

#[test]
fn grayscale_is_not_penalized_on_black_and_white_film() {
    let bw = |tags: TagMap| with(tags, keys::SCENE, json!("Tri-X 400"));
    let roll = TestRoll::new(2)
        .export(
            "a 1 bw.jpg",
            9_000_000,
            with(bw(frame("2023:09:07 14:22:10")), keys::GRAYSCALE, json!(true)),
        )
        .export("a 1.jpg", 8_000_000, bw(frame("2023:09:07 14:22:10")))
        .resolve();

    assert_eq!(master_names(&roll), vec!["a 1 bw.jpg"]);
    assert_eq!(roll.groups[0].reason, SelectionReason::LargerFile);
}

#[test]
fn panorama_penalty_outranks_resolution() {
    let dims = |tags: TagMap, w: u32, h: u32| {
        with(with(tags, keys::IMAGE_WIDTH, json!(w)), keys::IMAGE_HEIGHT, json!(h))
    };
    let roll = TestRoll::new(3)
        .export(
            "a 5 pano.jpg",
            30_000_000,
            with(
                dims(frame("2023:09:08 10:00:00"), 12000, 3000),
                keys::MERGED_PANORAMA,
                json!(true),
            ),
        )
        .export("a 5.jpg", 12_000_000, dims(frame("2023:09:08 10:00:00"), 6000, 4000))
        .export("a 5 small.jpg", 4_000_000, dims(frame("2023:09:08 10:00:00"), 3000, 2000))
        .resolve();

    assert_eq!(master_names(&roll), vec!["a 5.jpg"]);
    let master = roll.find("a 5.jpg").unwrap();
    let copies: Vec<&str> = master
        .copies
        .iter()
        .map(|id| roll.exposure(*id).file_name.as_str())
        .collect();
    // panorama ranks last despite the largest pixel count
    assert_eq!(copies, vec!["a 5 small.jpg", "a 5 pano.jpg"]);
}

#[test]
fn unique_timestamps_give_dense_indices_in_capture_order() {
    let mut test = TestRoll::new(4);
    // filenames numbered backwards so index order must come from timestamps
    for i in 0..10u32 {
        let name = format!("23-09-07 - {} - Chur.jpg", 10 - i);
        test = test.export(&name, 1_000, frame(&format!("2023:09:07 {:02}:00:00", 8 + i)));
    }
    let roll = test.resolve();

    assert_eq!(roll.master_count(), 10);
    assert_eq!(roll.copy_count(), 0);
    let mut previous = None;
    for (position, master) in roll.masters().enumerate() {
        assert_eq!(master.index, Some(position as u32 + 1));
        assert!(master.copies.is_empty());
        assert!(master.date_exposed() > previous);
        previous = master.date_exposed();
    }
    assert_eq!(roll.reindex.renumbered, 10);
}

#[test]
fn raw_binding_reports_missing_and_unmatched() {
    let roll = TestRoll::new(5)
        .export(
            "a 1.jpg",
            1_000,
            with(frame("2023:09:07 09:00:00"), keys::PRESERVED_FILE_NAME, json!("A.ARW")),
        )
        .export(
            "a 2.jpg",
            1_000,
            with(frame("2023:09:07 10:00:00"), keys::PRESERVED_FILE_NAME, json!("C.ARW")),
        )
        .raw("A.ARW")
        .raw("B.ARW")
        .resolve();

    let report = &roll.raw_report;
    assert_eq!(report.bindings.len(), 1);
    assert!(roll.find("a 1.jpg").unwrap().raw_path.as_ref().unwrap().ends_with("A.ARW"));
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].file_name, "a 2.jpg");
    assert_eq!(report.mismatches[0].reason, MismatchReason::NotFound);
    assert_eq!(report.unmatched.len(), 1);
    assert!(report.unmatched[0].ends_with("B.ARW"));

    let audit = roll.audit();
    assert_eq!(audit.missing_raws.len(), 1);
    assert_eq!(audit.unmatched_raws.len(), 1);
}

#[test]
fn raw_extension_policy_rewrites_expected_names() {
    let test = TestRoll::new(12)
        .export(
            "a 1.jpg",
            1_000,
            with(frame("2023:09:07 09:00:00"), keys::PRESERVED_FILE_NAME, json!("DSC0001.ARW")),
        )
        .raw("DSC0001.dng");

    let mut config = ArchiveConfig::default();
    config.overrides.insert(
        RollId(12),
        RollPolicy {
            raw_extension: Some("dng".to_string()),
            ..RollPolicy::default()
        },
    );
    let roll = test.resolve_with(config, test.exports.clone());

    assert_eq!(roll.raw_report.bindings.len(), 1);
    assert!(roll.raw_report.unmatched.is_empty());
}

#[test]
fn skip_grouping_policy_keeps_every_file_as_master() {
    let test = TestRoll::new(6)
        .export("a 1.jpg", 2_000, frame("2023:09:07 09:00:00"))
        .export("a 2.jpg", 1_000, frame("2023:09:07 09:00:00"));

    let mut config = ArchiveConfig::default();
    config.overrides.insert(
        RollId(6),
        RollPolicy {
            skip_grouping: true,
            note: Some("multi-exposure roll".to_string()),
            ..RollPolicy::default()
        },
    );
    let roll = test.resolve_with(config, test.exports.clone());

    assert_eq!(master_names(&roll), vec!["a 1.jpg", "a 2.jpg"]);
    assert_eq!(roll.copy_count(), 0);
    assert!(roll.audit().grouping_overridden);
}

#[test]
fn stock_aliases_apply_before_lookup() {
    let test = TestRoll::new(7).export(
        "a 1.jpg",
        1_000,
        with(frame("2023:09:07 09:00:00"), keys::SCENE, json!("Portra 400 (expired)")),
    );

    let mut config = ArchiveConfig::default();
    config.stock_aliases = BTreeMap::from([(
        "Portra 400 (expired)".to_string(),
        "Portra 400".to_string(),
    )]);
    let roll = test.resolve_with(config, test.exports.clone());

    assert_eq!(roll.attributes.stock.record.as_ref().map(|s| s.id.as_str()), Some("Portra 400"));
    assert_eq!(roll.exposures[0].film.camera_id.as_deref(), Some("F3"));
}

#[test]
fn missing_metadata_is_never_grouped() {
    let roll = TestRoll::new(8)
        .export("a 1.jpg", 1_000, frame("2023:09:07 09:00:00"))
        .export("a 2.jpg", 1_000, TagMap::new())
        .export("a 3.jpg", 1_000, TagMap::new())
        .resolve();

    assert_eq!(roll.master_count(), 3);
    assert_eq!(roll.copy_count(), 0);
    // untimed masters go last, by filename frame number
    assert_eq!(master_names(&roll), vec!["a 1.jpg", "a 2.jpg", "a 3.jpg"]);
    assert_eq!(roll.audit().missing_metadata.len(), 2);
}

#[test]
fn grouping_matches_timestamp_equality() {
    let roll = TestRoll::new(9)
        .export("a 1.jpg", 3_000, frame("2023:09:07 09:00:00"))
        .export("a 1 crop.jpg", 2_000, frame("2023:09:07 09:00:00"))
        .export("a 2.jpg", 3_000, frame("2023:09:07 09:00:01"))
        .export("a 3.jpg", 3_000, frame("2023:09:07 11:00:00"))
        .export("a 3 crop.jpg", 1_000, frame("2023:09:07 11:00:00"))
        .export("a 3 alt.jpg", 2_000, frame("2023:09:07 11:00:00"))
        .resolve();

    for a in &roll.exposures {
        for b in &roll.exposures {
            let same_group = a.original == b.original;
            assert_eq!(same_group, a.date_exposed() == b.date_exposed());
        }
    }
    for exposure in &roll.exposures {
        let original = roll.exposure(exposure.original.unwrap());
        assert_eq!(exposure.index, original.index);
        assert!(original.is_master);
        assert_eq!(original.original, Some(original.id));
    }
}

#[test]
fn resolution_is_idempotent() {
    let roll = TestRoll::new(10)
        .export("a 1.jpg", 3_000, with(frame("2023:09:07 09:00:00"), keys::PRESERVED_FILE_NAME, json!("A.ARW")))
        .export("a 1 crop.jpg", 2_000, with(frame("2023:09:07 09:00:00"), keys::PRESERVED_FILE_NAME, json!("A.ARW")))
        .export("a 4.jpg", 3_000, frame("2023:09:07 08:00:00"))
        .raw("A.ARW")
        .resolve();

    let mut again = roll.clone();
    let mut log = RollLog::new(again.id, null_sender());
    resolve_duplicates(&mut again, FilmKind::Color, &RollPolicy::default(), &mut log);
    reindex(&mut again, &mut log);
    match_raw_files(&mut again, &mut log);

    assert_eq!(again.masters, roll.masters);
    assert_eq!(again.groups, roll.groups);
    assert_eq!(again.raw_report, roll.raw_report);
    let indices = |r: &Roll| r.exposures.iter().map(|e| (e.index, e.original)).collect::<Vec<_>>();
    assert_eq!(indices(&again), indices(&roll));
}

#[test]
fn selection_ignores_input_order() {
    let test = TestRoll::new(11)
        .export("b 3.jpg", 5_000, frame("2023:09:07 09:00:00"))
        .export("a 3.jpg", 5_000, frame("2023:09:07 09:00:00"))
        .export("c 3.jpg", 4_000, frame("2023:09:07 09:00:00"))
        .export(
            "d 3.jpg",
            9_000,
            with(frame("2023:09:07 09:00:00"), keys::GRAYSCALE, json!(true)),
        )
        .export("e 4.jpg", 5_000, frame("2023:09:07 10:00:00"));

    let n = test.exports.len();
    let mut orders: Vec<Vec<ScannedFile>> = Vec::new();
    for rotation in 0..n {
        let mut rotated = test.exports.clone();
        rotated.rotate_left(rotation);
        orders.push(rotated.clone());
        rotated.reverse();
        orders.push(rotated);
    }

    let mut outcomes = HashSet::new();
    for exports in orders {
        let roll = test.resolve_with(ArchiveConfig::default(), exports);
        let copies: Vec<Vec<String>> = roll
            .masters()
            .map(|m| m.copies.iter().map(|c| roll.exposure(*c).file_name.clone()).collect())
            .collect();
        outcomes.insert((master_names(&roll), copies));
    }

    assert_eq!(outcomes.len(), 1);
    let (masters, _) = outcomes.into_iter().next().unwrap();
    assert_eq!(masters, vec!["a 3.jpg", "e 4.jpg"]);
}

#[test]
fn no_raw_file_is_bound_twice() {
    let tagged = |ts: &str, raw: &str| with(frame(ts), keys::PRESERVED_FILE_NAME, json!(raw));
    let roll = TestRoll::new(13)
        .export("a 1.jpg", 3_000, tagged("2023:09:07 09:00:00", "A.ARW"))
        .export("a 1 crop.jpg", 2_000, tagged("2023:09:07 09:00:00", "A.ARW"))
        .export("a 2.jpg", 3_000, tagged("2023:09:07 10:00:00", "A.ARW"))
        .raw("A.ARW")
        .resolve();

    let bound: Vec<_> = roll.exposures.iter().filter_map(|e| e.raw_path.clone()).collect();
    let unique: HashSet<_> = bound.iter().collect();
    assert_eq!(bound.len(), unique.len());
    assert_eq!(roll.raw_files.iter().filter(|r| r.bound_to.is_some()).count(), 1);
}

#[test]
fn metadata_failure_excludes_only_that_roll() {
    let root = TempDir::new().unwrap();
    let source = Arc::new(InMemorySource::new());

    let mut inputs = Vec::new();
    for id in [21u32, 22, 23] {
        let jpg = root.child(format!("{}_roll", id)).child("jpg");
        for i in 1..=5u32 {
            let file = jpg.child(format!("r{} {}.jpg", id, i));
            file.write_binary(&[0u8; 64]).unwrap();
            source.insert(file.path(), frame(&format!("2023:09:07 {:02}:00:00", 8 + i)));
        }
        inputs.push(RollInput {
            id: RollId(id),
            name: format!("{}_roll", id),
            export_dirs: vec![jpg.path().to_path_buf()],
            raw_dirs: vec![],
        });
    }
    source.fail_under(root.child("22_roll").path());

    let pipeline = Pipeline::builder()
        .references(references())
        .metadata_source(source)
        .build();
    let result = pipeline.run(&inputs).unwrap();

    let ids: Vec<RollId> = result.rolls.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![RollId(21), RollId(23)]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].roll, RollId(22));
    for roll in &result.rolls {
        assert_eq!(roll.master_count(), 5);
    }
    assert_eq!(result.summary().rolls_failed, 1);
}
