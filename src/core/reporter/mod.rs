//! # Reporter Module
//!
//! Explains what the engine decided for a roll.
//!
//! A [`RollAudit`] is built from a roll's resolved state on demand: which
//! exposures were grouped together and why a master won, which files could
//! not be read or parsed, which references were not found and which RAW
//! files are missing or left over. Writers in [`export`] turn rolls into JSON
//! and CSV for archiving.

pub mod export;

pub use export::{export_csv, export_json, ExportFormat};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::grouping::SelectionReason;
use crate::core::raw_match::MismatchReason;
use crate::core::roll::{Roll, RollId};
use crate::events::{DiagnosticKind, Severity};

/// One duplicate group as shown in the audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub index: Option<u32>,
    pub timestamp: Option<NaiveDateTime>,
    pub master: String,
    pub copies: Vec<String>,
    pub reason: SelectionReason,
}

/// An exposure whose RAW file is not on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRaw {
    pub exposure: String,
    pub index: Option<u32>,
    pub expected: Option<String>,
    pub reason: MismatchReason,
}

/// A stock or camera that has no reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Tag value that was looked up, `None` when no exposure carried one
    pub tag: Option<String>,
}

/// Diagnostics count per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
}

/// Structured summary of one roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollAudit {
    pub roll: RollId,
    pub name: String,
    pub exposures: usize,
    pub masters: usize,
    pub copies: usize,
    /// Groups with at least one copy
    pub duplicate_groups: Vec<GroupSummary>,
    pub grouping_overridden: bool,
    /// Groups decided by filename order after every other criterion tied
    pub ambiguous_selections: Vec<String>,
    pub duplicate_provisional_indices: Vec<u32>,
    pub format_errors: Vec<String>,
    pub missing_metadata: Vec<String>,
    pub missing_raws: Vec<MissingRaw>,
    pub unmatched_raws: Vec<PathBuf>,
    /// Directories or entries the scanner could not read
    pub scan_problems: Vec<String>,
    pub unresolved_stock: Option<UnresolvedReference>,
    pub unresolved_camera: Option<UnresolvedReference>,
    pub severity_counts: SeverityCounts,
}

impl RollAudit {
    pub fn from_roll(roll: &Roll) -> Self {
        let duplicate_groups = roll
            .groups
            .iter()
            .filter(|g| !g.copies.is_empty())
            .map(|g| {
                let master = roll.exposure(g.master);
                GroupSummary {
                    index: master.index,
                    timestamp: g.timestamp,
                    master: master.file_name.clone(),
                    copies: g
                        .copies
                        .iter()
                        .map(|id| roll.exposure(*id).file_name.clone())
                        .collect(),
                    reason: g.reason,
                }
            })
            .collect();

        let ambiguous_selections = roll
            .groups
            .iter()
            .filter(|g| g.reason == SelectionReason::FilenameOrder)
            .map(|g| roll.exposure(g.master).file_name.clone())
            .collect();

        let format_errors = roll
            .exposures
            .iter()
            .filter(|e| e.name.is_format_error())
            .map(|e| e.file_name.clone())
            .collect();

        let missing_metadata = roll
            .exposures
            .iter()
            .filter(|e| e.tags.is_none())
            .map(|e| e.file_name.clone())
            .collect();

        let missing_raws = roll
            .raw_report
            .mismatches
            .iter()
            .map(|m| MissingRaw {
                exposure: m.file_name.clone(),
                index: m.index,
                expected: m.expected.clone(),
                reason: m.reason,
            })
            .collect();

        let attributes = &roll.attributes;
        let unresolved_stock = match &attributes.stock.record {
            Some(_) => None,
            None => Some(UnresolvedReference {
                tag: attributes.stock.scene.clone(),
            }),
        };
        let unresolved_camera = match &attributes.camera {
            Some(_) => None,
            None => Some(UnresolvedReference {
                tag: attributes.camera_name.clone(),
            }),
        };

        let scan_problems = roll
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::ScanProblem)
            .map(|d| d.message.clone())
            .collect();

        let mut severity_counts = SeverityCounts::default();
        for diagnostic in &roll.diagnostics {
            match diagnostic.severity {
                Severity::Info => severity_counts.info += 1,
                Severity::Warning => severity_counts.warning += 1,
                Severity::Error => severity_counts.error += 1,
            }
        }

        Self {
            roll: roll.id,
            name: roll.name.clone(),
            exposures: roll.exposures.len(),
            masters: roll.master_count(),
            copies: roll.copy_count(),
            duplicate_groups,
            grouping_overridden: roll.grouping_overridden,
            ambiguous_selections,
            duplicate_provisional_indices: roll.reindex.duplicate_provisional.clone(),
            format_errors,
            missing_metadata,
            missing_raws,
            unmatched_raws: roll.raw_report.unmatched.clone(),
            scan_problems,
            unresolved_stock,
            unresolved_camera,
            severity_counts,
        }
    }

    /// Nothing in the roll needs attention
    pub fn is_clean(&self) -> bool {
        self.ambiguous_selections.is_empty()
            && self.duplicate_provisional_indices.is_empty()
            && self.format_errors.is_empty()
            && self.missing_metadata.is_empty()
            && self.missing_raws.is_empty()
            && self.unmatched_raws.is_empty()
            && self.scan_problems.is_empty()
            && self.unresolved_stock.is_none()
            && self.unresolved_camera.is_none()
            && self.severity_counts.error == 0
    }

    /// One-line summary for terminal output
    pub fn summary(&self) -> String {
        format!(
            "roll {} ({}): {} exposures, {} masters, {} copies, {} missing RAW, {} unmatched RAW",
            self.roll,
            self.name,
            self.exposures,
            self.masters,
            self.copies,
            self.missing_raws.len(),
            self.unmatched_raws.len()
        )
    }
}
