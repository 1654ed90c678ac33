//! # Aggregate Module
//!
//! Roll-level attributes and their write-back onto exposures.
//!
//! Stock identity is resolved before grouping (the grayscale penalty depends
//! on it) by [`resolve_stock`]. Everything else is computed by
//! [`aggregate_roll`] once masters are final:
//! - camera identity, from the first master that names one
//! - start and end capture dates, duration in calendar days inclusive
//! - up to two dominant locations
//! - byte and file counts for masters, copies and RAW files

mod reference;

pub use reference::{CameraRecord, ReferenceTables, StockRecord};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::exposure::FilmAttributes;
use crate::core::grouping::FilmKind;
use crate::core::roll::Roll;
use crate::events::{DiagnosticKind, RollLog, Subject};

const MAX_LOCATIONS: usize = 2;

/// Film stock identified for a roll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockResolution {
    /// Scene tag the stock was looked up by
    pub scene: Option<String>,
    pub record: Option<StockRecord>,
}

impl StockResolution {
    pub fn film_kind(&self) -> FilmKind {
        FilmKind::from_is_color(self.record.as_ref().map(|s| s.is_color))
    }
}

/// Byte and file counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTotals {
    pub master_bytes: u64,
    pub master_count: usize,
    pub copy_bytes: u64,
    pub copy_count: usize,
    pub raw_bytes: u64,
    pub raw_count: usize,
}

/// Aggregated attributes of a roll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollAttributes {
    pub stock: StockResolution,
    pub camera: Option<CameraRecord>,
    /// "Make Model" the camera was looked up by
    pub camera_name: Option<String>,
    /// Every distinct camera reported on the roll
    pub cameras: Vec<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub duration_days: Option<i64>,
    pub locations: Vec<String>,
    pub totals: SizeTotals,
}

/// Identify the roll's film stock from the earliest exposure with a scene tag
pub fn resolve_stock(roll: &Roll, tables: &ReferenceTables, log: &mut RollLog) -> StockResolution {
    let source = roll
        .exposures
        .iter()
        .filter(|e| e.scene().is_some())
        .min_by_key(|e| {
            let captured = e.date_exposed();
            let index = e.provisional_index();
            (captured.is_none(), captured, index.is_none(), index, e.file_name.clone())
        });

    let Some(source) = source else {
        log.warn(
            DiagnosticKind::UnresolvedStock,
            Subject::roll(),
            "no exposure carries a scene tag",
        );
        return StockResolution::default();
    };

    let scene = source.scene().map(str::to_string);
    let record = scene.as_deref().and_then(|s| tables.stock(s)).cloned();

    if record.is_none() {
        log.warn(
            DiagnosticKind::UnresolvedStock,
            Subject::exposure(&source.file_name, source.provisional_index()),
            format!("scene '{}' is not in the stock table", scene.as_deref().unwrap_or_default()),
        );
    }

    StockResolution { scene, record }
}

/// Compute roll attributes and write film attributes onto every exposure
pub fn aggregate_roll(
    roll: &mut Roll,
    tables: &ReferenceTables,
    stock: &StockResolution,
    log: &mut RollLog,
) -> RollAttributes {
    let (camera_name, camera) = resolve_camera(roll, tables, log);
    let cameras = distinct_cameras(roll);
    if cameras.len() > 1 {
        log.warn(
            DiagnosticKind::MultipleCameras,
            Subject::roll(),
            format!("multiple cameras on one roll: {}", cameras.join(", ")),
        );
    }

    let dates: Vec<NaiveDateTime> = roll.masters().filter_map(|e| e.date_exposed()).collect();
    let start_date = dates.first().copied();
    let end_date = dates.last().copied();
    let duration_days = match (start_date, end_date) {
        (Some(start), Some(end)) => Some((end.date() - start.date()).num_days() + 1),
        _ => None,
    };

    let attributes = RollAttributes {
        stock: stock.clone(),
        camera,
        camera_name,
        cameras,
        start_date,
        end_date,
        duration_days,
        locations: dominant_locations(roll),
        totals: size_totals(roll),
    };

    let film = film_attributes(&attributes);
    for exposure in &mut roll.exposures {
        exposure.film = film.clone();
    }

    roll.attributes = attributes.clone();
    attributes
}

fn resolve_camera(
    roll: &Roll,
    tables: &ReferenceTables,
    log: &mut RollLog,
) -> (Option<String>, Option<CameraRecord>) {
    let Some((make, model)) = roll.masters().find_map(|e| e.camera()) else {
        log.error(
            DiagnosticKind::UnresolvedCamera,
            Subject::roll(),
            "no exposure reports a camera make and model",
        );
        return (None, None);
    };

    let name = format!("{} {}", make, model);
    let record = tables.camera(make, model).cloned();
    if record.is_none() {
        log.error(
            DiagnosticKind::UnresolvedCamera,
            Subject::roll(),
            format!("camera '{}' is not in the camera table", name),
        );
    }
    (Some(name), record)
}

/// Distinct "Make Model" strings, compared case-insensitively, first spelling kept
fn distinct_cameras(roll: &Roll) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut cameras = Vec::new();
    for id in roll.resolution_order() {
        if let Some((make, model)) = roll.exposure(id).camera() {
            let name = format!("{} {}", make.trim(), model.trim());
            let key = name.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                cameras.push(name);
            }
        }
    }
    cameras
}

/// Most frequent locations in index order; ties go to the earlier one
fn dominant_locations(roll: &Roll) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut position = 0;
    for master in roll.masters() {
        let group = std::iter::once(master).chain(master.copies.iter().map(|id| roll.exposure(*id)));
        for exposure in group {
            if let Some(location) = exposure.location() {
                let entry = counts.entry(location).or_insert((0, position));
                entry.0 += 1;
            }
            position += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts.into_iter().map(|(l, (c, p))| (l, c, p)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(MAX_LOCATIONS)
        .map(|(l, _, _)| l.to_string())
        .collect()
}

fn size_totals(roll: &Roll) -> SizeTotals {
    let mut totals = SizeTotals::default();
    for exposure in &roll.exposures {
        if exposure.is_copy() {
            totals.copy_bytes += exposure.file_size;
            totals.copy_count += 1;
        } else if exposure.is_master {
            totals.master_bytes += exposure.file_size;
            totals.master_count += 1;
        }
    }
    for raw in &roll.raw_files {
        totals.raw_bytes += raw.size;
        totals.raw_count += 1;
    }
    totals
}

fn film_attributes(attributes: &RollAttributes) -> FilmAttributes {
    let stock = attributes.stock.record.as_ref();
    let camera = attributes.camera.as_ref();
    FilmAttributes {
        stock_id: stock.map(|s| s.id.clone()),
        stock_name: stock.map(|s| s.name.clone()),
        manufacturer: stock.map(|s| s.manufacturer.clone()),
        box_speed: stock.map(|s| s.box_speed),
        process: stock.map(|s| s.process.clone()),
        is_color: stock.map(|s| s.is_color),
        is_black_and_white: stock.map(|s| s.is_black_and_white),
        is_infrared: stock.map(|s| s.is_infrared),
        is_negative: stock.map(|s| s.is_negative),
        is_slide: stock.map(|s| s.is_slide),
        camera_id: camera.map(|c| c.id.clone()),
        film_type: camera.and_then(|c| c.film_type.clone()),
        film_format: camera.and_then(|c| c.film_format.clone()),
    }
}
