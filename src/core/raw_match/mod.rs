//! # Raw Match Module
//!
//! Binds resolved exposures to the RAW scans they were exported from.
//!
//! Exposures are visited masters first, then copies, both in final index
//! order. Each takes its expected RAW name out of the roll's pool of
//! unclaimed RAW files, so no RAW file is bound twice. A stitched panorama
//! copy whose expected name was already claimed by its master may take a
//! `<base>-Pano<ext>` file instead. Whatever is left in the pool is the
//! roll's unmatched RAW list.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use crate::core::exposure::ExposureId;
use crate::core::roll::Roll;
use crate::core::scanner::ScannedFile;
use crate::events::{DiagnosticKind, RollLog, Subject};

/// A RAW file found in the roll's raw directories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    /// Exposure this file is bound to
    pub bound_to: Option<ExposureId>,
}

impl From<ScannedFile> for RawFile {
    fn from(file: ScannedFile) -> Self {
        Self {
            path: file.path,
            file_name: file.file_name,
            size: file.size,
            bound_to: None,
        }
    }
}

/// Why an exposure has no RAW file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    /// The exposure does not say which RAW it came from
    NoExpectedName,
    /// The expected RAW is not in the pool
    NotFound,
}

/// An exposure that could not be bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMismatch {
    pub exposure: ExposureId,
    pub file_name: String,
    pub index: Option<u32>,
    pub expected: Option<String>,
    pub reason: MismatchReason,
}

/// A successful binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBinding {
    pub exposure: ExposureId,
    pub raw: PathBuf,
    /// Bound through the `-Pano` suffix
    pub panorama_variant: bool,
}

/// Result of matching one roll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatchReport {
    pub bindings: Vec<RawBinding>,
    pub mismatches: Vec<RawMismatch>,
    /// RAW files no exposure claimed
    pub unmatched: Vec<PathBuf>,
}

/// `DSC01374.ARW` → `DSC01374-Pano.ARW`
pub fn panorama_variant(expected: &str) -> String {
    match expected.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => format!("{}-Pano.{}", base, ext),
        _ => format!("{}-Pano", expected),
    }
}

/// Unclaimed RAW files by name; duplicates across directories queue up
struct RawPool {
    by_name: HashMap<String, VecDeque<usize>>,
}

impl RawPool {
    fn new(files: &[RawFile]) -> Self {
        let mut by_name: HashMap<String, VecDeque<usize>> = HashMap::new();
        for (position, file) in files.iter().enumerate() {
            by_name.entry(file.file_name.clone()).or_default().push_back(position);
        }
        Self { by_name }
    }

    fn take(&mut self, name: &str) -> Option<usize> {
        self.by_name.get_mut(name)?.pop_front()
    }
}

/// Bind every resolved exposure of the roll to its RAW file
pub fn match_raw_files(roll: &mut Roll, log: &mut RollLog) -> RawMatchReport {
    for file in &mut roll.raw_files {
        file.bound_to = None;
    }
    for exposure in &mut roll.exposures {
        exposure.raw_path = None;
    }

    let mut pool = RawPool::new(&roll.raw_files);
    let mut report = RawMatchReport::default();

    for id in roll.resolution_order() {
        let exposure = roll.exposure(id);
        let subject = Subject::exposure(&exposure.file_name, exposure.index);

        let Some(expected) = exposure.expected_raw.clone() else {
            log.warn(
                DiagnosticKind::RawMismatch,
                subject,
                "no preserved RAW file name in metadata",
            );
            report.mismatches.push(RawMismatch {
                exposure: id,
                file_name: exposure.file_name.clone(),
                index: exposure.index,
                expected: None,
                reason: MismatchReason::NoExpectedName,
            });
            continue;
        };

        let mut via_panorama = false;
        let mut found = pool.take(&expected);
        if found.is_none() && exposure.is_copy() && exposure.is_stitched_panorama() {
            found = pool.take(&panorama_variant(&expected));
            via_panorama = found.is_some();
        }

        match found {
            Some(position) => {
                let raw_path = roll.raw_files[position].path.clone();
                roll.raw_files[position].bound_to = Some(id);
                roll.exposure_mut(id).raw_path = Some(raw_path.clone());
                report.bindings.push(RawBinding {
                    exposure: id,
                    raw: raw_path,
                    panorama_variant: via_panorama,
                });
            }
            None => {
                log.warn(
                    DiagnosticKind::RawMismatch,
                    subject,
                    format!("expected RAW '{}' not found", expected),
                );
                report.mismatches.push(RawMismatch {
                    exposure: id,
                    file_name: exposure.file_name.clone(),
                    index: exposure.index,
                    expected: Some(expected),
                    reason: MismatchReason::NotFound,
                });
            }
        }
    }

    report.unmatched = roll
        .raw_files
        .iter()
        .filter(|f| f.bound_to.is_none())
        .map(|f| f.path.clone())
        .collect();

    if !report.unmatched.is_empty() {
        tracing::info!(
            roll = roll.id.0,
            unmatched = report.unmatched.len(),
            "RAW files without an exposure"
        );
    }

    roll.raw_report = report.clone();
    report
}
