//! # Error Module
//!
//! Error types for the film roll archive engine.
//!
//! ## Design Principles
//! - **Never panic** on archive data - return errors instead
//! - **Include context** - roll ids, paths, what went wrong
//! - **Scope failures** - a roll-level error never leaks into sibling rolls
//!
//! Record-level problems (an unparseable filename, a malformed shutter speed
//! tag) are *not* errors here: they are carried as data on the exposure and
//! reported as diagnostics, because they must never abort a roll.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::roll::RollId;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Reference table error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Roll {roll} failed: {source}")]
    Roll {
        roll: RollId,
        #[source]
        source: Box<ArchiveError>,
    },

    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

/// Errors that occur while listing a roll's export and RAW directories
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the external metadata source.
///
/// Any of these aborts the current roll; no partial duplicate resolution is
/// attempted on incomplete metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata tool '{tool}' is not installed or not on PATH")]
    ToolUnavailable { tool: String },

    #[error("Metadata tool '{tool}' exited with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error("Could not parse metadata output: {reason}")]
    UnparseableOutput { reason: String },

    #[error("Failed to read metadata from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors loading the read-only stock and camera tables
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to read reference tables at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid reference tables at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Duplicate stock id '{id}' in reference tables")]
    DuplicateStock { id: String },
}

/// Errors loading configuration or roll manifests
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Roll {roll} is listed more than once")]
    DuplicateRoll { roll: RollId },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ArchiveError>;
