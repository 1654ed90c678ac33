//! # Exposure Module
//!
//! One exported file of a physical exposure, and how it is built from its
//! filename and metadata tag map.
//!
//! ## Relationships
//! After duplicate resolution every exposure is either a master
//! (`original == Some(self.id)`, `copies` possibly non-empty) or a copy
//! (`original == Some(master)`, `copies` empty). Before resolution
//! `original` is `None`.

mod builder;
mod filename;
mod shutter;
mod tags;

pub use builder::{build_exposure, RecordContext};
pub use filename::{parse_name, NameFields, NameGrammar, ParsedName};
pub use shutter::{parse_seconds, ShutterSpeed};
pub use tags::{keys, parse_timestamp, ExposureTags, TagError};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of an exposure in its roll's exposure table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExposureId(pub usize);

/// Aspect classification of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    Vertical,
    Square,
    Horizontal,
    Panorama,
}

impl AspectClass {
    /// Classify a width/height ratio. Panorama wins over square, square over
    /// vertical and horizontal.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.85 {
            AspectClass::Panorama
        } else if ratio > 0.9 && ratio < 1.1 {
            AspectClass::Square
        } else if ratio < 1.0 {
            AspectClass::Vertical
        } else {
            AspectClass::Horizontal
        }
    }
}

/// Derived image geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub ratio: f64,
    pub class: AspectClass,
    pub megapixels: f64,
    pub is_vertical: bool,
    pub is_square: bool,
    pub is_horizontal: bool,
    pub is_panorama: bool,
}

impl Geometry {
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let ratio = f64::from(width) / f64::from(height);
        Some(Self {
            ratio,
            class: AspectClass::from_ratio(ratio),
            megapixels: f64::from(width) * f64::from(height) / 1_000_000.0,
            is_vertical: ratio < 1.0,
            is_square: ratio > 0.9 && ratio < 1.1,
            is_horizontal: ratio > 1.0,
            is_panorama: ratio > 1.85,
        })
    }
}

/// Film-level attributes fanned out from the roll onto every exposure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilmAttributes {
    pub stock_id: Option<String>,
    pub stock_name: Option<String>,
    pub manufacturer: Option<String>,
    pub box_speed: Option<u32>,
    pub process: Option<String>,
    pub is_color: Option<bool>,
    pub is_black_and_white: Option<bool>,
    pub is_infrared: Option<bool>,
    pub is_negative: Option<bool>,
    pub is_slide: Option<bool>,
    pub camera_id: Option<String>,
    pub film_type: Option<String>,
    pub film_format: Option<String>,
}

/// One exported image file of a physical exposure
#[derive(Debug, Clone, Serialize)]
pub struct Exposure {
    pub id: ExposureId,
    pub path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
    /// Filename-derived fields, or the format error sentinel
    pub name: ParsedName,
    /// `None` when the metadata source returned nothing for this file
    pub tags: Option<ExposureTags>,
    pub tag_errors: Vec<TagError>,
    pub geometry: Option<Geometry>,
    /// RAW file name this exposure expects to find
    pub expected_raw: Option<String>,
    /// RAW file bound during matching
    pub raw_path: Option<PathBuf>,
    pub is_master: bool,
    pub original: Option<ExposureId>,
    pub copies: Vec<ExposureId>,
    /// Final dense frame number
    pub index: Option<u32>,
    pub film: FilmAttributes,
}

impl Exposure {
    /// Frame number parsed from the filename
    pub fn provisional_index(&self) -> Option<u32> {
        self.name.index()
    }

    pub fn date_exposed(&self) -> Option<NaiveDateTime> {
        self.tags.as_ref().and_then(|t| t.date_exposed)
    }

    pub fn date_created(&self) -> Option<NaiveDateTime> {
        self.tags.as_ref().and_then(|t| t.date_created)
    }

    pub fn is_grayscale_conversion(&self) -> bool {
        self.tags.as_ref().is_some_and(|t| t.grayscale)
    }

    pub fn is_stitched_panorama(&self) -> bool {
        self.tags.as_ref().is_some_and(|t| t.merged_panorama)
    }

    /// Pixel count, 0 when dimensions are unknown
    pub fn pixel_count(&self) -> u64 {
        match self.tags.as_ref().map(|t| (t.width, t.height)) {
            Some((Some(w), Some(h))) => u64::from(w) * u64::from(h),
            _ => 0,
        }
    }

    pub fn megapixels(&self) -> Option<f64> {
        self.geometry.map(|g| g.megapixels)
    }

    pub fn scene(&self) -> Option<&str> {
        self.tags.as_ref().and_then(|t| t.scene.as_deref())
    }

    /// City tag, falling back to the filename location
    pub fn location(&self) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(|t| t.city.as_deref())
            .or_else(|| self.name.fields().and_then(|f| f.location.as_deref()))
    }

    pub fn camera(&self) -> Option<(&str, &str)> {
        let tags = self.tags.as_ref()?;
        Some((tags.camera_make.as_deref()?, tags.camera_model.as_deref()?))
    }

    pub fn exposure_value(&self) -> Option<f64> {
        self.tags.as_ref().and_then(ExposureTags::exposure_value)
    }

    pub fn is_copy(&self) -> bool {
        matches!(self.original, Some(original) if original != self.id)
    }

    /// Drop any master/copy role and final index
    pub fn clear_role(&mut self) {
        self.is_master = false;
        self.original = None;
        self.copies.clear();
        self.index = None;
    }
}
