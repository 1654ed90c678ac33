//! Export of resolved rolls.
//!
//! JSON carries every roll with its audit; CSV has one row per exposure,
//! masters and their copies in final index order.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use super::RollAudit;
use crate::core::exposure::Exposure;
use crate::core::roll::Roll;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

#[derive(Serialize)]
struct RollExport<'a> {
    roll: &'a Roll,
    audit: RollAudit,
}

/// Write rolls and their audits as a pretty-printed JSON array
pub fn export_json<W: Write>(rolls: &[Roll], writer: W) -> io::Result<()> {
    let document: Vec<RollExport<'_>> = rolls
        .iter()
        .map(|roll| RollExport {
            roll,
            audit: roll.audit(),
        })
        .collect();
    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

const CSV_HEADER: &str = "Roll,Index,File,Role,Original,Captured,Width,Height,Aspect,Stock,Camera,Location,Size (bytes),RAW";

/// Write one CSV row per exposure
pub fn export_csv<W: Write>(rolls: &[Roll], mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;

    for roll in rolls {
        for id in row_order(roll) {
            let exposure = roll.exposure(id);
            let original = exposure
                .original
                .filter(|o| *o != exposure.id)
                .map(|o| roll.exposure(o).file_name.as_str())
                .unwrap_or("");
            let fields = [
                roll.id.to_string(),
                optional(exposure.index),
                csv_field(&exposure.file_name),
                role(exposure).to_string(),
                csv_field(original),
                optional(exposure.date_exposed().map(|d| d.format("%Y-%m-%d %H:%M:%S"))),
                optional(exposure.tags.as_ref().and_then(|t| t.width)),
                optional(exposure.tags.as_ref().and_then(|t| t.height)),
                optional(exposure.geometry.as_ref().map(|g| format!("{:?}", g.class).to_lowercase())),
                csv_field(exposure.film.stock_id.as_deref().unwrap_or("")),
                csv_field(exposure.film.camera_id.as_deref().unwrap_or("")),
                csv_field(exposure.location().unwrap_or("")),
                exposure.file_size.to_string(),
                csv_field(&exposure.raw_path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()),
            ];
            writeln!(writer, "{}", fields.join(","))?;
        }
    }

    Ok(())
}

/// Masters with their copies in index order, then anything left unresolved
fn row_order(roll: &Roll) -> Vec<crate::core::exposure::ExposureId> {
    let mut order = Vec::with_capacity(roll.exposures.len());
    for master in roll.masters() {
        order.push(master.id);
        order.extend(master.copies.iter().copied());
    }
    for exposure in &roll.exposures {
        if !order.contains(&exposure.id) {
            order.push(exposure.id);
        }
    }
    order
}

fn role(exposure: &Exposure) -> &'static str {
    if exposure.is_master {
        "master"
    } else if exposure.is_copy() {
        "copy"
    } else {
        "unresolved"
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Export rolls to a file
pub fn export_to_file(rolls: &[Roll], path: &Path, format: ExportFormat) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = io::BufWriter::new(file);

    match format {
        ExportFormat::Json => export_json(rolls, writer),
        ExportFormat::Csv => export_csv(rolls, writer),
    }
}
