//! Event type definitions for progress reporting and diagnostics.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::roll::RollId;

/// All events emitted by the archive pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory listing events
    Scan(ScanEvent),
    /// Per-roll processing events
    Roll(RollEvent),
    /// A structured diagnostic raised while processing a roll
    Diagnostic(Diagnostic),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while listing export and RAW directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// A directory listing started
    Started { roll: RollId, paths: Vec<PathBuf> },
    /// A directory could not be read; listing continues
    Error { path: PathBuf, message: String },
    /// Listing completed
    Completed {
        roll: RollId,
        exports: usize,
        raws: usize,
    },
}

/// Events for a single roll moving through the stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RollEvent {
    /// Processing of the roll started
    Started { roll: RollId, files: usize },
    /// The roll entered a new stage
    StageChanged { roll: RollId, stage: RollStage },
    /// The roll finished
    Completed {
        roll: RollId,
        masters: usize,
        copies: usize,
        unmatched_raws: usize,
    },
    /// The roll was aborted and is excluded from the results
    Failed { roll: RollId, message: String },
}

/// Stages of per-roll processing, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollStage {
    Listing,
    Metadata,
    Records,
    Grouping,
    Reindexing,
    RawMatching,
    Aggregating,
}

impl std::fmt::Display for RollStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollStage::Listing => write!(f, "Listing"),
            RollStage::Metadata => write!(f, "Reading metadata"),
            RollStage::Records => write!(f, "Building records"),
            RollStage::Grouping => write!(f, "Grouping duplicates"),
            RollStage::Reindexing => write!(f, "Reindexing"),
            RollStage::RawMatching => write!(f, "Matching RAW files"),
            RollStage::Aggregating => write!(f, "Aggregating"),
        }
    }
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started { total_rolls: usize },
    /// Pipeline completed
    Completed { summary: PipelineSummary },
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Rolls that completed
    pub rolls_processed: usize,
    /// Rolls excluded because of a fatal roll error
    pub rolls_failed: usize,
    /// Masters across all processed rolls
    pub total_masters: usize,
    /// Copies across all processed rolls
    pub total_copies: usize,
    /// RAW files not claimed by any exposure
    pub unmatched_raws: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Filename matched no naming grammar
    FormatError,
    /// The metadata source returned nothing for a file
    MissingMetadata,
    /// A tag was present but could not be converted
    TagConversion,
    /// Two files carried the same filename frame number
    DuplicateIndex,
    /// The roll's scene tag is not in the stock table
    UnresolvedStock,
    /// The roll's camera is not in the camera table
    UnresolvedCamera,
    /// More than one camera reported on a single roll
    MultipleCameras,
    /// An exposure's expected RAW file was not found
    RawMismatch,
    /// Master chosen by filename order after a full ranking tie
    AmbiguousSelection,
    /// Duplicate grouping was skipped by a roll policy
    GroupingOverridden,
    /// A roll directory or entry could not be listed
    ScanProblem,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticKind::FormatError => "format_error",
            DiagnosticKind::MissingMetadata => "missing_metadata",
            DiagnosticKind::TagConversion => "tag_conversion",
            DiagnosticKind::DuplicateIndex => "duplicate_index",
            DiagnosticKind::UnresolvedStock => "unresolved_stock",
            DiagnosticKind::UnresolvedCamera => "unresolved_camera",
            DiagnosticKind::MultipleCameras => "multiple_cameras",
            DiagnosticKind::RawMismatch => "raw_mismatch",
            DiagnosticKind::AmbiguousSelection => "ambiguous_selection",
            DiagnosticKind::GroupingOverridden => "grouping_overridden",
            DiagnosticKind::ScanProblem => "scan_problem",
        };
        write!(f, "{}", name)
    }
}

/// A structured diagnostic with roll and exposure context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub roll: RollId,
    /// File name of the exposure concerned, if any
    pub exposure: Option<String>,
    /// Frame number of the exposure concerned (final if assigned, else provisional)
    pub index: Option<u32>,
    pub message: String,
}
