//! In-process EXIF reader.
//!
//! Covers the EXIF fields only. IPTC and XMP tags (location, scene, preserved
//! RAW name, grayscale and panorama flags) are never present, so exposures
//! read this way cannot be RAW-matched or stock-resolved.

use exif::{In, Reader, Tag, Value};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{MetadataSource, TagMap};
use crate::core::exposure::keys;
use crate::error::MetadataError;

/// Reads EXIF directly from JPEG/TIFF containers with `kamadak-exif`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedExifSource;

impl EmbeddedExifSource {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataSource for EmbeddedExifSource {
    fn name(&self) -> &str {
        "embedded-exif"
    }

    fn read_batch(&self, paths: &[PathBuf]) -> Result<HashMap<PathBuf, TagMap>, MetadataError> {
        Ok(paths
            .par_iter()
            .filter_map(|path| read_tags(path).map(|tags| (path.clone(), tags)))
            .collect())
    }
}

/// Read one file; `None` when it has no readable EXIF block
fn read_tags(path: &Path) -> Option<TagMap> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(&file);
    let exif = Reader::new().read_from_container(&mut bufreader).ok()?;

    let mut tags = TagMap::new();
    tags.insert("SourceFile", path.display().to_string());

    let text_fields = [
        (Tag::DateTimeOriginal, keys::DATE_EXPOSED),
        (Tag::DateTimeDigitized, keys::DATE_CREATED),
        (Tag::Make, keys::CAMERA_MAKE),
        (Tag::Model, keys::CAMERA_MODEL),
        (Tag::LensMake, keys::LENS_MAKE),
        (Tag::LensModel, keys::LENS_MODEL),
    ];
    for (tag, key) in text_fields {
        if let Some(value) = exif.get_field(tag, In::PRIMARY).and_then(|f| get_string_value(&f.value)) {
            tags.insert(key, value);
        }
    }

    if let Some(value) = exif.get_field(Tag::FNumber, In::PRIMARY).and_then(|f| get_f64_value(&f.value)) {
        tags.insert(keys::F_NUMBER, value);
    }
    if let Some(value) = exif.get_field(Tag::FocalLength, In::PRIMARY).and_then(|f| get_f64_value(&f.value)) {
        tags.insert(keys::FOCAL_LENGTH, value);
    }
    if let Some(value) = exif
        .get_field(Tag::PhotographicSensitivity, In::PRIMARY)
        .and_then(|f| get_u32_value(&f.value))
    {
        tags.insert(keys::ISO, value);
    }
    if let Some(field) = exif.get_field(Tag::ExposureTime, In::PRIMARY) {
        if let Value::Rational(ref vec) = field.value {
            if let Some(r) = vec.first() {
                tags.insert(keys::SHUTTER_SPEED, format!("{}/{}", r.num, r.denom));
            }
        }
    }

    // Prefer actual pixel dimensions
    let width = exif
        .get_field(Tag::PixelXDimension, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::ImageWidth, In::PRIMARY))
        .and_then(|f| get_u32_value(&f.value));
    let height = exif
        .get_field(Tag::PixelYDimension, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::ImageLength, In::PRIMARY))
        .and_then(|f| get_u32_value(&f.value));
    if let (Some(w), Some(h)) = (width, height) {
        tags.insert(keys::IMAGE_WIDTH, w);
        tags.insert(keys::IMAGE_HEIGHT, h);
    }

    Some(tags)
}

fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| u32::from(*v)),
        _ => None,
    }
}

fn get_f64_value(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(vec) => vec.first().filter(|r| r.denom != 0).map(|r| r.to_f64()),
        _ => get_u32_value(value).map(f64::from),
    }
}

fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
