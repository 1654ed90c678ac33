//! `exiftool` backed metadata source.

use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use super::{MetadataSource, TagMap};
use crate::error::MetadataError;

const DEFAULT_PROGRAM: &str = "exiftool";

/// Runs `exiftool -j -a -u -g1` once per roll
#[derive(Debug, Clone)]
pub struct ExifToolSource {
    program: PathBuf,
}

impl ExifToolSource {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
        }
    }

    /// Use a specific executable instead of `exiftool` from PATH
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn tool(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for ExifToolSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for ExifToolSource {
    fn name(&self) -> &str {
        "exiftool"
    }

    fn read_batch(&self, paths: &[PathBuf]) -> Result<HashMap<PathBuf, TagMap>, MetadataError> {
        if paths.is_empty() {
            return Ok(HashMap::new());
        }

        tracing::debug!(tool = %self.tool(), files = paths.len(), "Running metadata tool");

        let output = Command::new(&self.program)
            .args(["-j", "-a", "-u", "-g1"])
            .args(paths)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => MetadataError::ToolUnavailable {
                    tool: self.tool(),
                },
                _ => MetadataError::Io {
                    path: self.program.clone(),
                    source: e,
                },
            })?;

        // exiftool exits 1 when some files had no readable metadata but still
        // prints JSON for the rest; only empty output on failure is fatal
        if !output.status.success() && output.stdout.is_empty() {
            return Err(MetadataError::ToolFailed {
                tool: self.tool(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !output.status.success() {
            tracing::warn!(
                tool = %self.tool(),
                status = output.status.code().unwrap_or(-1),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Metadata tool exited with an error; using the output it printed"
            );
        }

        parse_output(&output.stdout)
    }
}

/// Parse the JSON array printed by `exiftool -j -g1`
pub(crate) fn parse_output(stdout: &[u8]) -> Result<HashMap<PathBuf, TagMap>, MetadataError> {
    let parsed: Value = serde_json::from_slice(stdout).map_err(|e| MetadataError::UnparseableOutput {
        reason: e.to_string(),
    })?;

    let Value::Array(records) = parsed else {
        return Err(MetadataError::UnparseableOutput {
            reason: "expected a JSON array".to_string(),
        });
    };

    let mut result = HashMap::with_capacity(records.len());
    for record in records {
        let Value::Object(object) = record else {
            return Err(MetadataError::UnparseableOutput {
                reason: "expected an object per file".to_string(),
            });
        };
        let Some(source) = object.get("SourceFile").and_then(Value::as_str) else {
            return Err(MetadataError::UnparseableOutput {
                reason: "record without SourceFile".to_string(),
            });
        };
        result.insert(PathBuf::from(source), TagMap::from_grouped(&object));
    }

    Ok(result)
}
