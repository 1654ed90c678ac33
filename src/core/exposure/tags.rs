//! Typed view of a metadata tag map.
//!
//! This is the only place raw tag values are converted. Every conversion
//! problem becomes a [`TagError`] next to the partially filled
//! [`ExposureTags`], never a panic or an `Err` for the whole record.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shutter::ShutterSpeed;
use crate::core::metadata::TagMap;

/// Tag keys, as `Group:Tag` pairs from the metadata source
pub mod keys {
    pub const PRESERVED_FILE_NAME: &str = "XMP-xmpMM:PreservedFileName";
    pub const CITY: &str = "IPTC:City";
    pub const STATE: &str = "IPTC:Province-State";
    pub const COUNTRY: &str = "IPTC:Country-PrimaryLocationName";
    pub const SCENE: &str = "XMP-iptcCore:Scene";
    pub const RATING: &str = "XMP-xmp:Rating";
    pub const ISO: &str = "ExifIFD:ISO";
    pub const F_NUMBER: &str = "ExifIFD:FNumber";
    pub const SHUTTER_SPEED: &str = "ExifIFD:ShutterSpeedValue";
    pub const DATE_EXPOSED: &str = "ExifIFD:DateTimeOriginal";
    pub const DATE_CREATED: &str = "ExifIFD:CreateDate";
    pub const CAMERA_MAKE: &str = "IFD0:Make";
    pub const CAMERA_MODEL: &str = "IFD0:Model";
    pub const LENS_MAKE: &str = "ExifIFD:LensMake";
    pub const LENS_MODEL: &str = "ExifIFD:LensModel";
    pub const FOCAL_LENGTH: &str = "ExifIFD:FocalLength";
    pub const IMAGE_WIDTH: &str = "File:ImageWidth";
    pub const IMAGE_HEIGHT: &str = "File:ImageHeight";
    pub const GRAYSCALE: &str = "XMP-crs:ConvertToGrayscale";
    pub const MERGED_PANORAMA: &str = "XMP-aux:IsMergedPanorama";
}

/// A tag that was present but could not be converted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagError {
    pub tag: String,
    pub value: String,
    pub reason: String,
}

/// Typed exposure fields read from a tag map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureTags {
    pub preserved_file_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub scene: Option<String>,
    pub rating: u8,
    pub iso: Option<u32>,
    pub f_number: Option<f64>,
    pub shutter: Option<ShutterSpeed>,
    pub date_exposed: Option<NaiveDateTime>,
    pub date_created: Option<NaiveDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub grayscale: bool,
    pub merged_panorama: bool,
}

impl ExposureTags {
    /// Convert a tag map, collecting every conversion failure
    pub fn from_tag_map(tags: &TagMap) -> (Self, Vec<TagError>) {
        let mut reader = Reader {
            tags,
            errors: Vec::new(),
        };

        let parsed = Self {
            preserved_file_name: reader.text(keys::PRESERVED_FILE_NAME),
            city: reader.text(keys::CITY),
            state: reader.text(keys::STATE),
            country: reader.text(keys::COUNTRY),
            scene: reader.text(keys::SCENE),
            rating: reader.convert(keys::RATING, to_u8).unwrap_or(0),
            iso: reader.convert(keys::ISO, to_u32),
            f_number: reader.convert(keys::F_NUMBER, to_f64),
            shutter: reader.convert(keys::SHUTTER_SPEED, to_shutter),
            date_exposed: reader.convert(keys::DATE_EXPOSED, to_timestamp),
            date_created: reader.convert(keys::DATE_CREATED, to_timestamp),
            camera_make: reader.text(keys::CAMERA_MAKE),
            camera_model: reader.text(keys::CAMERA_MODEL),
            lens_make: reader.text(keys::LENS_MAKE),
            lens_model: reader.text(keys::LENS_MODEL),
            focal_length: reader.convert(keys::FOCAL_LENGTH, to_focal_length),
            width: reader.convert(keys::IMAGE_WIDTH, to_u32),
            height: reader.convert(keys::IMAGE_HEIGHT, to_u32),
            grayscale: reader.convert(keys::GRAYSCALE, to_flag).unwrap_or(false),
            merged_panorama: reader.convert(keys::MERGED_PANORAMA, to_flag).unwrap_or(false),
        };

        (parsed, reader.errors)
    }

    /// Exposure value `log2(N² / (ISO · t))`
    pub fn exposure_value(&self) -> Option<f64> {
        let n = self.f_number?;
        let iso = f64::from(self.iso?);
        let t = self.shutter.as_ref()?.seconds;
        if n <= 0.0 || iso <= 0.0 || t <= 0.0 {
            return None;
        }
        Some((n * n / (iso * t)).log2())
    }

    /// "Make Model", when both are known
    pub fn camera(&self) -> Option<String> {
        match (&self.camera_make, &self.camera_model) {
            (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
            _ => None,
        }
    }

    pub fn lens(&self) -> Option<String> {
        match (&self.lens_make, &self.lens_model) {
            (Some(make), Some(model)) => Some(format!("{} {}", make, model)),
            (None, Some(model)) => Some(model.clone()),
            _ => None,
        }
    }
}

struct Reader<'a> {
    tags: &'a TagMap,
    errors: Vec<TagError>,
}

impl Reader<'_> {
    fn text(&self, key: &str) -> Option<String> {
        self.tags.get(key).map(render)
    }

    fn convert<T>(&mut self, key: &str, conv: fn(&Value) -> Result<T, String>) -> Option<T> {
        let value = self.tags.get(key)?;
        match conv(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                self.errors.push(TagError {
                    tag: key.to_string(),
                    value: render(value),
                    reason,
                });
                None
            }
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn to_f64(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| "not a finite number".to_string()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s.trim())),
        other => Err(format!("expected a number, got {}", other)),
    }
}

fn to_u32(value: &Value) -> Result<u32, String> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_u64() {
            return u32::try_from(i).map_err(|_| format!("{} is out of range", i));
        }
    }
    let float = to_f64(value)?;
    if float.fract() != 0.0 || float < 0.0 || float > f64::from(u32::MAX) {
        return Err(format!("{} is not a whole number", float));
    }
    Ok(float as u32)
}

fn to_u8(value: &Value) -> Result<u8, String> {
    let n = to_u32(value)?;
    u8::try_from(n).map_err(|_| format!("{} is out of range", n))
}

fn to_shutter(value: &Value) -> Result<ShutterSpeed, String> {
    match value {
        Value::Number(n) => {
            let seconds = n.as_f64().ok_or_else(|| "not a finite number".to_string())?;
            Ok(ShutterSpeed {
                text: n.to_string(),
                seconds,
            })
        }
        Value::String(s) => ShutterSpeed::parse(s),
        other => Err(format!("expected a shutter speed, got {}", other)),
    }
}

fn to_focal_length(value: &Value) -> Result<f64, String> {
    match value {
        Value::String(s) => {
            let first = s.split_whitespace().next().unwrap_or("");
            let first = first.trim_end_matches("mm");
            first
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a focal length", s.trim()))
        }
        other => to_f64(other),
    }
}

fn to_flag(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("{} is not a flag", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(format!("'{}' is not a flag", other)),
        },
        other => Err(format!("expected a flag, got {}", other)),
    }
}

fn to_timestamp(value: &Value) -> Result<NaiveDateTime, String> {
    match value {
        Value::String(s) => parse_timestamp(s).ok_or_else(|| format!("'{}' is not a timestamp", s.trim())),
        other => Err(format!("expected a timestamp, got {}", other)),
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y:%m:%d", "%Y-%m-%d"];

/// Parse a capture or creation timestamp.
///
/// Sub-second and timezone suffixes (`.123`, `+02:00`) are ignored.
/// Date-only values resolve to midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Some(head) = text.get(..19) {
        for format in DATETIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(head, format) {
                return Some(parsed);
            }
        }
    }

    let head = text.get(..10)?;
    // A full datetime with an unparseable time part is not a date
    if text.len() > 10 && text.as_bytes()[10] != b' ' {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(head, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
